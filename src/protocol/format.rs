//! COPY BINARY format constants.
//!
//! Reference: https://www.postgresql.org/docs/current/sql-copy.html#id-1.9.3.55.9.4

/// File signature: `PGCOPY\n\377\r\n\0`
pub const SIGNATURE: &[u8; 11] = b"PGCOPY\n\xFF\r\n\0";

/// Flags field (bit 16 would mean OIDs are included - never set).
pub const FLAGS: i32 = 0;

/// Header extension area length (extensions unsupported).
pub const HEADER_EXTENSION_LEN: i32 = 0;

/// Field length marking a NULL column.
pub const NULL_LENGTH: i32 = -1;

/// Field count that terminates the stream.
pub const TRAILER: i16 = -1;

/// Header size in bytes: signature + flags + extension length.
pub const HEADER_LEN: usize = SIGNATURE.len() + 4 + 4;

/// PostgreSQL type OIDs used by the binary codecs.
pub mod oid {
    pub const BYTEA: u32 = 17;

    // Integers
    pub const INT8: u32 = 20; // bigint
    pub const INT2: u32 = 21; // smallint
    pub const INT4: u32 = 23; // integer

    pub const VARCHAR: u32 = 1043;

    // JSON
    pub const JSON: u32 = 114;
    pub const JSONB: u32 = 3802;

    pub const NUMERIC: u32 = 1700;
    pub const INET: u32 = 869;
    pub const UUID: u32 = 2950;
}

/// Map a column hint OID to its PostgreSQL type name
pub fn oid_to_name(oid: u32) -> &'static str {
    match oid {
        oid::BYTEA => "bytea",
        oid::INT8 => "int8",
        oid::INT2 => "int2",
        oid::JSON => "json",
        oid::JSONB => "jsonb",
        oid::NUMERIC => "numeric",
        oid::INET => "inet",
        oid::UUID => "uuid",
        _ => "unknown",
    }
}

// ==================== NUMERIC ====================

/// Decimal digits per NUMERIC digit group (NBASE = 10000).
pub const NUMERIC_DEC_DIGITS: usize = 4;

/// ndigits + weight + sign + dscale
pub const NUMERIC_HEADER_LEN: usize = 8;

pub const NUMERIC_POS: u16 = 0x0000;
pub const NUMERIC_NEG: u16 = 0x4000;
pub const NUMERIC_NAN: u16 = 0xC000;
pub const NUMERIC_PINF: u16 = 0xD000;
pub const NUMERIC_NINF: u16 = 0xF000;

// ==================== INET ====================

/// PGSQL_AF_INET
pub const INET_FAMILY_V4: u8 = 2;
/// PGSQL_AF_INET6 (AF_INET + 1, not the platform value)
pub const INET_FAMILY_V6: u8 = 3;

/// family + bits + is_cidr + address length
pub const INET_HEADER_LEN: usize = 4;

// ==================== ARRAY / JSONB ====================

/// Only one-dimensional arrays are produced.
pub const ARRAY_NDIM: i32 = 1;
/// Array flags: no NULL elements present.
pub const ARRAY_FLAGS_NO_NULLS: i32 = 0;
pub const ARRAY_LOWER_BOUND: i32 = 1;

pub const JSONB_VERSION: u8 = 1;

// ==================== Date/Time ====================

/// PostgreSQL epoch: 2000-01-01 00:00:00 UTC
/// Difference from Unix epoch (1970-01-01) in microseconds
pub const PG_EPOCH_OFFSET_USEC: i64 = 946_684_800_000_000;

/// `NaiveDate::num_days_from_ce()` of 2000-01-01.
pub const PG_EPOCH_DAYS_FROM_CE: i32 = 730_120;
