//! Named integer constants exposed to the host.
//!
//! Low-level codec calls report one of a closed, POSIX-flavored set of
//! outcome codes; the host branches on these rather than on raised errors.
//! Sample-format tags and the flag bits accepted by the initializers live
//! here too.

pub const SUCCESS: i32 = 0;
pub const ERROR: i32 = -1;
pub const INVALID_ARGS: i32 = -2;
pub const INVALID_OPERATION: i32 = -3;
pub const OUT_OF_MEMORY: i32 = -4;
pub const OUT_OF_RANGE: i32 = -5;
pub const ACCESS_DENIED: i32 = -6;
pub const DOES_NOT_EXIST: i32 = -7;
pub const ALREADY_EXISTS: i32 = -8;
pub const TOO_MANY_OPEN_FILES: i32 = -9;
pub const INVALID_FILE: i32 = -10;
pub const TOO_BIG: i32 = -11;
pub const PATH_TOO_LONG: i32 = -12;
pub const NAME_TOO_LONG: i32 = -13;
pub const NOT_DIRECTORY: i32 = -14;
pub const IS_DIRECTORY: i32 = -15;
pub const DIRECTORY_NOT_EMPTY: i32 = -16;
pub const END_OF_FILE: i32 = -17;
pub const NO_SPACE: i32 = -18;
pub const BUSY: i32 = -19;
pub const IO_ERROR: i32 = -20;
pub const INTERRUPT: i32 = -21;
pub const UNAVAILABLE: i32 = -22;
pub const ALREADY_IN_USE: i32 = -23;
pub const BAD_ADDRESS: i32 = -24;
pub const BAD_SEEK: i32 = -25;
pub const BAD_PIPE: i32 = -26;
pub const DEADLOCK: i32 = -27;
pub const TOO_MANY_LINKS: i32 = -28;
pub const NOT_IMPLEMENTED: i32 = -29;
pub const NO_MESSAGE: i32 = -30;
pub const BAD_MESSAGE: i32 = -31;
pub const NO_DATA_AVAILABLE: i32 = -32;
pub const INVALID_DATA: i32 = -33;
pub const TIMEOUT: i32 = -34;
pub const NO_NETWORK: i32 = -35;
pub const NOT_UNIQUE: i32 = -36;
pub const NOT_SOCKET: i32 = -37;
pub const NO_ADDRESS: i32 = -38;
pub const BAD_PROTOCOL: i32 = -39;
pub const PROTOCOL_UNAVAILABLE: i32 = -40;
pub const PROTOCOL_NOT_SUPPORTED: i32 = -41;
pub const PROTOCOL_FAMILY_NOT_SUPPORTED: i32 = -42;
pub const ADDRESS_FAMILY_NOT_SUPPORTED: i32 = -43;
pub const SOCKET_NOT_SUPPORTED: i32 = -44;
pub const CONNECTION_RESET: i32 = -45;
pub const ALREADY_CONNECTED: i32 = -46;
pub const NOT_CONNECTED: i32 = -47;
pub const CONNECTION_REFUSED: i32 = -48;
pub const NO_HOST: i32 = -49;
pub const IN_PROGRESS: i32 = -50;
pub const CANCELLED: i32 = -51;
pub const MEMORY_ALREADY_MAPPED: i32 = -52;
pub const AT_END: i32 = -53;

// Sample format tags
pub const FORMAT_PCM: u16 = 0x1;
pub const FORMAT_ADPCM: u16 = 0x2;
pub const FORMAT_IEEE_FLOAT: u16 = 0x3;
pub const FORMAT_ALAW: u16 = 0x6;
pub const FORMAT_MULAW: u16 = 0x7;
pub const FORMAT_DVI_ADPCM: u16 = 0x11;
pub const FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// Parse-strictness / mode bits forwarded to the codec's initializers.
pub const FLAG_SEQUENTIAL: u32 = 0x0000_0001;

pub const MAX_SMPL_LOOPS: u32 = 1;

/// Human-readable name for a status code, for logs and host diagnostics.
pub fn status_name(code: i32) -> &'static str {
    match code {
        SUCCESS => "Success",
        ERROR => "Error",
        INVALID_ARGS => "InvalidArgs",
        INVALID_OPERATION => "InvalidOperation",
        OUT_OF_MEMORY => "OutOfMemory",
        OUT_OF_RANGE => "OutOfRange",
        ACCESS_DENIED => "AccessDenied",
        DOES_NOT_EXIST => "DoesNotExist",
        ALREADY_EXISTS => "AlreadyExists",
        TOO_MANY_OPEN_FILES => "TooManyOpenFiles",
        INVALID_FILE => "InvalidFile",
        TOO_BIG => "TooBig",
        PATH_TOO_LONG => "PathTooLong",
        NAME_TOO_LONG => "NameTooLong",
        NOT_DIRECTORY => "NotDirectory",
        IS_DIRECTORY => "IsDirectory",
        DIRECTORY_NOT_EMPTY => "DirectoryNotEmpty",
        END_OF_FILE => "EndOfFile",
        NO_SPACE => "NoSpace",
        BUSY => "Busy",
        IO_ERROR => "IoError",
        INTERRUPT => "Interrupt",
        UNAVAILABLE => "Unavailable",
        ALREADY_IN_USE => "AlreadyInUse",
        BAD_ADDRESS => "BadAddress",
        BAD_SEEK => "BadSeek",
        BAD_PIPE => "BadPipe",
        DEADLOCK => "Deadlock",
        TOO_MANY_LINKS => "TooManyLinks",
        NOT_IMPLEMENTED => "NotImplemented",
        NO_MESSAGE => "NoMessage",
        BAD_MESSAGE => "BadMessage",
        NO_DATA_AVAILABLE => "NoDataAvailable",
        INVALID_DATA => "InvalidData",
        TIMEOUT => "Timeout",
        NO_NETWORK => "NoNetwork",
        NOT_UNIQUE => "NotUnique",
        NOT_SOCKET => "NotSocket",
        NO_ADDRESS => "NoAddress",
        BAD_PROTOCOL => "BadProtocol",
        PROTOCOL_UNAVAILABLE => "ProtocolUnavailable",
        PROTOCOL_NOT_SUPPORTED => "ProtocolNotSupported",
        PROTOCOL_FAMILY_NOT_SUPPORTED => "ProtocolFamilyNotSupported",
        ADDRESS_FAMILY_NOT_SUPPORTED => "AddressFamilyNotSupported",
        SOCKET_NOT_SUPPORTED => "SocketNotSupported",
        CONNECTION_RESET => "ConnectionReset",
        ALREADY_CONNECTED => "AlreadyConnected",
        NOT_CONNECTED => "NotConnected",
        CONNECTION_REFUSED => "ConnectionRefused",
        NO_HOST => "NoHost",
        IN_PROGRESS => "InProgress",
        CANCELLED => "Cancelled",
        MEMORY_ALREADY_MAPPED => "MemoryAlreadyMapped",
        AT_END => "AtEnd",
        _ => "Unknown",
    }
}
