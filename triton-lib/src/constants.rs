// Protocol constants for the Triton-Lite configuration link

/// Frame start marker (ASCII `$`)
pub const HEADER: u8 = 0x24;

/// Frame end marker (ASCII `;`)
pub const FOOTER: u8 = 0x3B;

/// Character wrapped around the hex text when delimiting is on
pub const TEXT_START: char = '$';

/// Character closing the hex text when delimiting is on
pub const TEXT_END: char = ';';

/// Offset added to the one-byte year on the wire
pub const YEAR_BASE: u16 = 2000;

/// Largest year a single offset byte can carry
pub const YEAR_MAX: u16 = YEAR_BASE + u8::MAX as u16;

/// Clock fields: year offset, month, day, hour, minute, second
pub const TIME_FIELDS_SIZE: usize = 6;

/// Four 16-bit event windows
pub const WINDOW_FIELDS_SIZE: usize = 8;

/// Offset of the mode byte in both frame variants
pub const MODE_OFFSET: usize = 1 + TIME_FIELDS_SIZE + WINDOW_FIELDS_SIZE;

/// Checksum byte + footer byte
pub const TRAILER_SIZE: usize = 2;

/// Full Variant A frame (header through footer)
pub const FRAME_A_SIZE: usize = MODE_OFFSET + 1 + TRAILER_SIZE;

/// Full Variant B frame, with dive count and pressure threshold
pub const FRAME_B_SIZE: usize = FRAME_A_SIZE + 2;

/// Shortest byte sequence that can be a frame
pub const MIN_FRAME_SIZE: usize = FRAME_A_SIZE;

/// Serial line speed used by the device firmware
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Substring the device prints once it accepted a frame
pub const ACK_TOKEN: &str = "Checksum valid: true";

/// Prefix of the line the simulator prints for a rejected frame
pub const NAK_PREFIX: &str = "Checksum valid: false";

/// Line the device firmware prints when the checksum byte is wrong
pub const FIRMWARE_NAK: &str = "Checksum does not match";
