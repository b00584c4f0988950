use tracing::warn;

use super::{read_u16_le, read_u32_le};
use crate::error::{DumpError, Result};

// -----------------------------------------------------------------------------
// Constantes del superblock de ext2
// -----------------------------------------------------------------------------

/// El superblock siempre está a 1024 bytes del inicio de la imagen.
pub const SUPERBLOCK_OFFSET: u64 = 1024;
/// Tamaño del registro en disco.
pub const SUPERBLOCK_SIZE: usize = 1024;
pub const EXT2_SUPER_MAGIC: u16 = 0xEF53;

/// Valores fijos de las imágenes con revisión 0.
pub const EXT2_GOOD_OLD_REV: u32 = 0;
pub const EXT2_GOOD_OLD_INODE_SIZE: u16 = 128;
pub const EXT2_GOOD_OLD_FIRST_INO: u32 = 11;

/// Bloques de hasta 64 KiB (1024 << 6).
const MAX_LOG_BLOCK_SIZE: u32 = 6;

/// Parámetros globales del filesystem, leídos una sola vez.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Superblock {
    pub inodes_count: u32,
    pub blocks_count: u32,
    pub first_data_block: u32,
    pub log_block_size: u32,
    pub blocks_per_group: u32,
    pub inodes_per_group: u32,
    pub magic: u16,
    pub rev_level: u32,
    pub first_ino: u32,
    pub inode_size: u16,
}

impl Superblock {
    /// Decodifica los campos usados desde el registro crudo de 1024 bytes
    /// y valida la geometría que necesita el resto del recorrido.
    pub fn parse(raw: &[u8]) -> Result<Superblock> {
        if raw.len() < SUPERBLOCK_SIZE {
            return Err(DumpError::TruncatedRead {
                what: "superblock",
                offset: SUPERBLOCK_OFFSET,
                expected: SUPERBLOCK_SIZE,
                got: raw.len(),
            });
        }

        let rev_level = read_u32_le(raw, 0x4C);

        // Revisión 0: primer inodo e inode_size son constantes
        let (first_ino, inode_size) = if rev_level == EXT2_GOOD_OLD_REV {
            (EXT2_GOOD_OLD_FIRST_INO, EXT2_GOOD_OLD_INODE_SIZE)
        } else {
            (read_u32_le(raw, 0x54), read_u16_le(raw, 0x58))
        };

        let sb = Superblock {
            inodes_count: read_u32_le(raw, 0x00),
            blocks_count: read_u32_le(raw, 0x04),
            first_data_block: read_u32_le(raw, 0x14),
            log_block_size: read_u32_le(raw, 0x18),
            blocks_per_group: read_u32_le(raw, 0x20),
            inodes_per_group: read_u32_le(raw, 0x28),
            magic: read_u16_le(raw, 0x38),
            rev_level,
            first_ino,
            inode_size,
        };

        if sb.magic != EXT2_SUPER_MAGIC {
            warn!(
                "magic del superblock {:#06x} no es de ext2, se continúa igual",
                sb.magic
            );
        }

        sb.validate()?;
        Ok(sb)
    }

    fn validate(&self) -> Result<()> {
        if self.log_block_size > MAX_LOG_BLOCK_SIZE {
            return Err(DumpError::InvalidGeometry(format!(
                "log_block_size = {} (máximo {})",
                self.log_block_size, MAX_LOG_BLOCK_SIZE
            )));
        }

        // Un bitmap ocupa un solo bloque: debe cubrir todo el grupo
        let bits_per_bitmap = self.block_size() * 8;

        if self.blocks_per_group == 0 || self.blocks_per_group > bits_per_bitmap {
            return Err(DumpError::InvalidGeometry(format!(
                "blocks_per_group = {} (debe estar en 1..={})",
                self.blocks_per_group, bits_per_bitmap
            )));
        }

        if self.inodes_per_group == 0 || self.inodes_per_group > bits_per_bitmap {
            return Err(DumpError::InvalidGeometry(format!(
                "inodes_per_group = {} (debe estar en 1..={})",
                self.inodes_per_group, bits_per_bitmap
            )));
        }

        if self.inode_size < EXT2_GOOD_OLD_INODE_SIZE {
            return Err(DumpError::InvalidGeometry(format!(
                "inode_size = {} (mínimo {})",
                self.inode_size, EXT2_GOOD_OLD_INODE_SIZE
            )));
        }

        Ok(())
    }

    /// Tamaño de bloque en bytes: 1024 << log_block_size.
    pub fn block_size(&self) -> u32 {
        1024 << self.log_block_size
    }

    /// ceil(blocks_count / blocks_per_group)
    pub fn group_count(&self) -> u32 {
        self.blocks_count.div_ceil(self.blocks_per_group)
    }

    /// Offset absoluto de la tabla de descriptores de grupo.
    pub fn group_table_offset(&self) -> u64 {
        (self.first_data_block as u64 + 1) * self.block_size() as u64
    }

    /// Bloques del grupo `index`. El último grupo puede estar incompleto.
    pub fn blocks_in_group(&self, index: u32) -> u32 {
        if index + 1 < self.group_count() {
            return self.blocks_per_group;
        }
        match self.blocks_count % self.blocks_per_group {
            0 => self.blocks_per_group,
            rest => rest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Superblock crudo mínimo de revisión 1.
    fn raw_superblock(blocks: u32, per_group: u32, log_block_size: u32) -> Vec<u8> {
        let mut raw = vec![0u8; SUPERBLOCK_SIZE];
        raw[0x00..0x04].copy_from_slice(&64u32.to_le_bytes());
        raw[0x04..0x08].copy_from_slice(&blocks.to_le_bytes());
        raw[0x14..0x18].copy_from_slice(&1u32.to_le_bytes());
        raw[0x18..0x1C].copy_from_slice(&log_block_size.to_le_bytes());
        raw[0x20..0x24].copy_from_slice(&per_group.to_le_bytes());
        raw[0x28..0x2C].copy_from_slice(&32u32.to_le_bytes());
        raw[0x38..0x3A].copy_from_slice(&EXT2_SUPER_MAGIC.to_le_bytes());
        raw[0x4C..0x50].copy_from_slice(&1u32.to_le_bytes());
        raw[0x54..0x58].copy_from_slice(&11u32.to_le_bytes());
        raw[0x58..0x5A].copy_from_slice(&128u16.to_le_bytes());
        raw
    }

    #[test]
    fn parse_reads_fields_and_block_size() {
        let sb = Superblock::parse(&raw_superblock(100, 8192, 0)).unwrap();
        assert_eq!(sb.blocks_count, 100);
        assert_eq!(sb.inodes_count, 64);
        assert_eq!(sb.block_size(), 1024);
        assert_eq!(sb.inode_size, 128);
        assert_eq!(sb.first_ino, 11);
        assert_eq!(sb.group_table_offset(), 2048);

        let sb = Superblock::parse(&raw_superblock(100, 8192, 2)).unwrap();
        assert_eq!(sb.block_size(), 4096);
    }

    #[test]
    fn revision_zero_uses_fixed_values() {
        let mut raw = raw_superblock(100, 8192, 0);
        raw[0x4C..0x50].copy_from_slice(&0u32.to_le_bytes());
        raw[0x54..0x58].copy_from_slice(&99u32.to_le_bytes());
        raw[0x58..0x5A].copy_from_slice(&256u16.to_le_bytes());

        let sb = Superblock::parse(&raw).unwrap();
        assert_eq!(sb.first_ino, EXT2_GOOD_OLD_FIRST_INO);
        assert_eq!(sb.inode_size, EXT2_GOOD_OLD_INODE_SIZE);
    }

    #[test]
    fn last_group_is_partial() {
        let sb = Superblock::parse(&raw_superblock(20_000, 8192, 0)).unwrap();
        assert_eq!(sb.group_count(), 3);
        assert_eq!(sb.blocks_in_group(0), 8192);
        assert_eq!(sb.blocks_in_group(1), 8192);
        assert_eq!(sb.blocks_in_group(2), 20_000 - 2 * 8192);

        let total: u32 = (0..sb.group_count()).map(|g| sb.blocks_in_group(g)).sum();
        assert_eq!(total, 20_000);
    }

    #[test]
    fn evenly_divided_groups_are_full() {
        let sb = Superblock::parse(&raw_superblock(16_384, 8192, 0)).unwrap();
        assert_eq!(sb.group_count(), 2);
        assert_eq!(sb.blocks_in_group(1), 8192);
    }

    #[test]
    fn rejects_zero_blocks_per_group() {
        let err = Superblock::parse(&raw_superblock(100, 0, 0)).unwrap_err();
        assert!(matches!(err, DumpError::InvalidGeometry(_)));
    }

    #[test]
    fn rejects_group_larger_than_bitmap() {
        let err = Superblock::parse(&raw_superblock(100_000, 8193, 0)).unwrap_err();
        assert!(matches!(err, DumpError::InvalidGeometry(_)));
    }

    #[test]
    fn short_buffer_is_truncated_read() {
        let err = Superblock::parse(&[0u8; 100]).unwrap_err();
        assert!(matches!(err, DumpError::TruncatedRead { got: 100, .. }));
    }
}
