use super::{read_u16_le, read_u32_le};
use crate::error::{DumpError, Result};

// Bits de tipo del modo (i_mode & S_IFMT)
pub const S_IFMT: u16 = libc::S_IFMT as u16;
pub const S_IFREG: u16 = libc::S_IFREG as u16;
pub const S_IFDIR: u16 = libc::S_IFDIR as u16;
pub const S_IFLNK: u16 = libc::S_IFLNK as u16;

/// Tipo + permisos: los 12 bits bajos del modo.
pub const MODE_MASK: u16 = 0o7777;

/// Cantidad de punteros en i_block.
pub const EXT2_N_BLOCKS: usize = 15;
/// Punteros directos (los 12 primeros).
pub const EXT2_NDIR_BLOCKS: usize = 12;
/// Un symlink con destino de menos de 60 bytes lo guarda dentro de i_block.
pub const FAST_SYMLINK_MAX: u32 = 60;

/// Parte fija del inodo que se decodifica.
pub const INODE_BASE_SIZE: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InodeKind {
    Regular,
    Directory,
    Symlink,
    Other,
}

impl InodeKind {
    pub fn from_mode(mode: u16) -> Self {
        match mode & S_IFMT {
            S_IFREG => InodeKind::Regular,
            S_IFDIR => InodeKind::Directory,
            S_IFLNK => InodeKind::Symlink,
            _ => InodeKind::Other,
        }
    }

    /// Etiqueta de una letra para el registro INODE.
    pub fn tag(self) -> char {
        match self {
            InodeKind::Regular => 'f',
            InodeKind::Directory => 'd',
            InodeKind::Symlink => 's',
            InodeKind::Other => '?',
        }
    }
}

/// Inodo de ext2 decodificado campo por campo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inode {
    pub mode: u16,
    pub uid: u16,
    pub size: u32,
    pub atime: u32,
    pub ctime: u32,
    pub mtime: u32,
    pub gid: u16,
    pub links_count: u16,
    /// En unidades de 512 bytes.
    pub blocks: u32,
    pub block: [u32; EXT2_N_BLOCKS],
}

impl Inode {
    pub fn parse(raw: &[u8]) -> Result<Inode> {
        if raw.len() < INODE_BASE_SIZE {
            return Err(DumpError::TruncatedRead {
                what: "inodo",
                offset: 0,
                expected: INODE_BASE_SIZE,
                got: raw.len(),
            });
        }

        let mut block = [0u32; EXT2_N_BLOCKS];
        for (i, ptr) in block.iter_mut().enumerate() {
            *ptr = read_u32_le(raw, 0x28 + i * 4);
        }

        Ok(Inode {
            mode: read_u16_le(raw, 0x00),
            uid: read_u16_le(raw, 0x02),
            size: read_u32_le(raw, 0x04),
            atime: read_u32_le(raw, 0x08),
            ctime: read_u32_le(raw, 0x0C),
            mtime: read_u32_le(raw, 0x10),
            gid: read_u16_le(raw, 0x18),
            links_count: read_u16_le(raw, 0x1A),
            blocks: read_u32_le(raw, 0x1C),
            block,
        })
    }

    /// Modo y links en cero: el slot no está en uso.
    pub fn is_unallocated(&self) -> bool {
        self.mode == 0 && self.links_count == 0
    }

    pub fn kind(&self) -> InodeKind {
        InodeKind::from_mode(self.mode)
    }

    pub fn is_dir(&self) -> bool {
        self.kind() == InodeKind::Directory
    }

    pub fn permission_bits(&self) -> u16 {
        self.mode & MODE_MASK
    }

    pub fn direct_blocks(&self) -> &[u32] {
        &self.block[..EXT2_NDIR_BLOCKS]
    }

    /// Punteros que se listan al final del registro INODE, según el tipo:
    /// - regular o directorio: los 15, ceros incluidos
    /// - symlink rápido (size < 60): solo el primer slot
    /// - symlink lento: solo los que no son cero
    /// - cualquier otro: nada
    pub fn listed_blocks(&self) -> Vec<u32> {
        match self.kind() {
            InodeKind::Regular | InodeKind::Directory => self.block.to_vec(),
            InodeKind::Symlink if self.size < FAST_SYMLINK_MAX => vec![self.block[0]],
            InodeKind::Symlink => self.block.iter().copied().filter(|&b| b != 0).collect(),
            InodeKind::Other => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_inode(mode: u16, links: u16, size: u32, block: &[u32]) -> Vec<u8> {
        let mut raw = vec![0u8; INODE_BASE_SIZE];
        raw[0x00..0x02].copy_from_slice(&mode.to_le_bytes());
        raw[0x04..0x08].copy_from_slice(&size.to_le_bytes());
        raw[0x1A..0x1C].copy_from_slice(&links.to_le_bytes());
        for (i, b) in block.iter().enumerate() {
            raw[0x28 + i * 4..0x2C + i * 4].copy_from_slice(&b.to_le_bytes());
        }
        raw
    }

    #[test]
    fn kind_from_mode_bits() {
        assert_eq!(InodeKind::from_mode(0o100644), InodeKind::Regular);
        assert_eq!(InodeKind::from_mode(0o040755), InodeKind::Directory);
        assert_eq!(InodeKind::from_mode(0o120777), InodeKind::Symlink);
        assert_eq!(InodeKind::from_mode(0o020644), InodeKind::Other);
        assert_eq!(InodeKind::Other.tag(), '?');
    }

    #[test]
    fn parse_reads_block_pointers() {
        let raw = raw_inode(0o100644, 1, 5000, &[9, 10, 0, 12]);
        let inode = Inode::parse(&raw).unwrap();
        assert_eq!(inode.block[..4], [9, 10, 0, 12]);
        assert_eq!(inode.size, 5000);
        assert_eq!(inode.permission_bits(), 0o644);
        assert_eq!(inode.listed_blocks().len(), EXT2_N_BLOCKS);
    }

    #[test]
    fn unallocated_needs_both_fields_zero() {
        let free = Inode::parse(&raw_inode(0, 0, 0, &[])).unwrap();
        assert!(free.is_unallocated());

        // Borrado pero con links: se reporta
        let odd = Inode::parse(&raw_inode(0, 1, 0, &[])).unwrap();
        assert!(!odd.is_unallocated());
    }

    #[test]
    fn symlink_listing_depends_on_size() {
        let fast = Inode::parse(&raw_inode(0o120777, 1, 59, &[0x6f6f_662f, 0, 0x7261])).unwrap();
        assert_eq!(fast.listed_blocks(), vec![0x6f6f_662f]);

        let slow = Inode::parse(&raw_inode(0o120777, 1, 60, &[0, 40, 0, 41])).unwrap();
        assert_eq!(slow.listed_blocks(), vec![40, 41]);
    }

    #[test]
    fn other_kinds_list_nothing() {
        let fifo = Inode::parse(&raw_inode(0o010644, 1, 0, &[1, 2])).unwrap();
        assert!(fifo.listed_blocks().is_empty());
    }
}
