// Registros de salida: una línea CSV por registro, con prefijo de tipo.
use std::fmt;
use std::io::{self, Write};

use crate::layout::inode::InodeKind;
use crate::time::format_timestamp;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Superblock {
        blocks: u32,
        inodes: u32,
        block_size: u32,
        inode_size: u16,
        blocks_per_group: u32,
        inodes_per_group: u32,
        first_ino: u32,
    },
    Group {
        index: u32,
        blocks: u32,
        inodes: u32,
        free_blocks: u16,
        free_inodes: u16,
        block_bitmap: u32,
        inode_bitmap: u32,
        inode_table: u32,
    },
    BlockFree(u64),
    InodeFree(u64),
    Inode {
        number: u64,
        kind: InodeKind,
        mode: u16,
        uid: u16,
        gid: u16,
        links: u16,
        ctime: u32,
        mtime: u32,
        atime: u32,
        size: u32,
        blocks: u32,
        pointers: Vec<u32>,
    },
    DirEntry {
        owner: u64,
        offset: u64,
        inode: u32,
        rec_len: u16,
        name_len: u8,
        /// Bytes tal cual están en el disco; no tienen por qué ser UTF-8.
        name: Vec<u8>,
    },
}

impl Record {
    /// Escribe la línea completa, con salto de línea.
    ///
    /// El nombre de DIRENT se copia byte por byte entre las comillas; el resto
    /// de los registros pasa por `Display`.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        match self {
            Record::DirEntry {
                owner,
                offset,
                inode,
                rec_len,
                name_len,
                name,
            } => {
                write!(out, "DIRENT,{owner},{offset},{inode},{rec_len},{name_len},'")?;
                out.write_all(name)?;
                out.write_all(b"'\n")
            }
            other => writeln!(out, "{other}"),
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Record::Superblock {
                blocks,
                inodes,
                block_size,
                inode_size,
                blocks_per_group,
                inodes_per_group,
                first_ino,
            } => write!(
                f,
                "SUPERBLOCK,{blocks},{inodes},{block_size},{inode_size},{blocks_per_group},{inodes_per_group},{first_ino}"
            ),
            Record::Group {
                index,
                blocks,
                inodes,
                free_blocks,
                free_inodes,
                block_bitmap,
                inode_bitmap,
                inode_table,
            } => write!(
                f,
                "GROUP,{index},{blocks},{inodes},{free_blocks},{free_inodes},{block_bitmap},{inode_bitmap},{inode_table}"
            ),
            Record::BlockFree(n) => write!(f, "BFREE,{n}"),
            Record::InodeFree(n) => write!(f, "IFREE,{n}"),
            Record::Inode {
                number,
                kind,
                mode,
                uid,
                gid,
                links,
                ctime,
                mtime,
                atime,
                size,
                blocks,
                pointers,
            } => {
                write!(
                    f,
                    "INODE,{},{},{:o},{},{},{},{},{},{},{},{}",
                    number,
                    kind.tag(),
                    mode,
                    uid,
                    gid,
                    links,
                    format_timestamp(*ctime),
                    format_timestamp(*mtime),
                    format_timestamp(*atime),
                    size,
                    blocks
                )?;
                for ptr in pointers {
                    write!(f, ",{ptr}")?;
                }
                Ok(())
            }
            Record::DirEntry {
                owner,
                offset,
                inode,
                rec_len,
                name_len,
                name,
            } => write!(
                f,
                "DIRENT,{owner},{offset},{inode},{rec_len},{name_len},'{}'",
                String::from_utf8_lossy(name)
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn superblock_line() {
        let r = Record::Superblock {
            blocks: 64,
            inodes: 24,
            block_size: 1024,
            inode_size: 128,
            blocks_per_group: 8192,
            inodes_per_group: 24,
            first_ino: 11,
        };
        assert_eq!(r.to_string(), "SUPERBLOCK,64,24,1024,128,8192,24,11");
    }

    #[test]
    fn inode_line_with_octal_mode_and_pointers() {
        let r = Record::Inode {
            number: 2,
            kind: InodeKind::Directory,
            mode: 0o755,
            uid: 0,
            gid: 0,
            links: 3,
            ctime: 0,
            mtime: 60,
            atime: 3_600,
            size: 1024,
            blocks: 2,
            pointers: vec![21, 0],
        };
        assert_eq!(
            r.to_string(),
            "INODE,2,d,755,0,0,3,01/01/70 00:00:00,01/01/70 00:01:00,01/01/70 01:00:00,1024,2,21,0"
        );
    }

    #[test]
    fn inode_line_without_pointers() {
        let r = Record::Inode {
            number: 7,
            kind: InodeKind::Other,
            mode: 0o644,
            uid: 1000,
            gid: 100,
            links: 1,
            ctime: 0,
            mtime: 0,
            atime: 0,
            size: 0,
            blocks: 0,
            pointers: vec![],
        };
        assert!(r.to_string().ends_with(",0,0"));
        assert!(r.to_string().starts_with("INODE,7,?,644,1000,100,1,"));
    }

    #[test]
    fn dirent_line_quotes_name() {
        let r = Record::DirEntry {
            owner: 2,
            offset: 12,
            inode: 2,
            rec_len: 12,
            name_len: 2,
            name: b"..".to_vec(),
        };
        assert_eq!(r.to_string(), "DIRENT,2,12,2,12,2,'..'");
        assert_eq!(Record::BlockFree(9).to_string(), "BFREE,9");
        assert_eq!(Record::InodeFree(3).to_string(), "IFREE,3");
    }

    #[test]
    fn write_to_keeps_raw_name_bytes() {
        let r = Record::DirEntry {
            owner: 2,
            offset: 24,
            inode: 12,
            rec_len: 12,
            name_len: 4,
            name: b"caf\xe9".to_vec(),
        };
        let mut out = Vec::new();
        r.write_to(&mut out).unwrap();
        assert_eq!(out, b"DIRENT,2,24,12,12,4,'caf\xe9'\n");

        let mut out = Vec::new();
        Record::BlockFree(9).write_to(&mut out).unwrap();
        assert_eq!(out, b"BFREE,9\n");
    }
}
