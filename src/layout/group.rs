use super::{read_u16_le, read_u32_le};
use crate::error::{DumpError, Result};

/// Tamaño de un descriptor de grupo en ext2.
pub const GROUP_DESC_SIZE: usize = 32;

/// Descriptor de un grupo de bloques. Los números de bloque son absolutos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDescriptor {
    pub block_bitmap: u32,
    pub inode_bitmap: u32,
    pub inode_table: u32,
    pub free_blocks_count: u16,
    pub free_inodes_count: u16,
    pub used_dirs_count: u16,
}

impl GroupDescriptor {
    pub fn parse(raw: &[u8]) -> Result<GroupDescriptor> {
        if raw.len() < GROUP_DESC_SIZE {
            return Err(DumpError::TruncatedRead {
                what: "descriptor de grupo",
                offset: 0,
                expected: GROUP_DESC_SIZE,
                got: raw.len(),
            });
        }

        Ok(GroupDescriptor {
            block_bitmap: read_u32_le(raw, 0x00),
            inode_bitmap: read_u32_le(raw, 0x04),
            inode_table: read_u32_le(raw, 0x08),
            free_blocks_count: read_u16_le(raw, 0x0C),
            free_inodes_count: read_u16_le(raw, 0x0E),
            used_dirs_count: read_u16_le(raw, 0x10),
        })
    }
}
