/* Recorrido completo de la imagen.
Por cada grupo: descriptor, bitmaps, tabla de inodos y entradas de los
directorios. Cada registro se escribe apenas se produce; si algo falla,
lo ya escrito queda en la salida. */

use std::io::Write;

use tracing::{debug, info, warn};

use crate::bitmap::{free_block_number, free_inode_number, Bitmap};
use crate::error::{DumpError, Result};
use crate::image::ImageReader;
use crate::layout::dir_entry::{self, DirSlot};
use crate::layout::group::{GroupDescriptor, GROUP_DESC_SIZE};
use crate::layout::inode::Inode;
use crate::layout::superblock::{Superblock, SUPERBLOCK_OFFSET, SUPERBLOCK_SIZE};
use crate::record::Record;

pub struct Dumper<R, W> {
    image: R,
    out: W,
}

impl<R: ImageReader, W: Write> Dumper<R, W> {
    pub fn new(image: R, out: W) -> Self {
        Self { image, out }
    }

    /// Devuelve el writer con todo lo emitido hasta el momento, aun si `run` falló.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Ejecuta todas las etapas sobre la imagen.
    pub fn run(&mut self) -> Result<()> {
        let sb = self.read_superblock()?;

        for group in 0..sb.group_count() {
            let gd = self.read_group(&sb, group)?;
            self.scan_block_bitmap(&sb, group, &gd)?;
            self.scan_inode_bitmap(&sb, &gd)?;
            self.walk_inode_table(&sb, group, &gd)?;
        }

        self.out.flush()?;
        Ok(())
    }

    fn emit(&mut self, record: Record) -> Result<()> {
        record.write_to(&mut self.out)?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Etapa 1: superblock
    // -------------------------------------------------------------------------

    pub fn read_superblock(&mut self) -> Result<Superblock> {
        let raw = self
            .image
            .read_record("superblock", SUPERBLOCK_OFFSET, SUPERBLOCK_SIZE)?;
        let sb = Superblock::parse(&raw)?;

        info!(
            blocks = sb.blocks_count,
            inodes = sb.inodes_count,
            block_size = sb.block_size(),
            groups = sb.group_count(),
            "superblock leído"
        );

        self.emit(Record::Superblock {
            blocks: sb.blocks_count,
            inodes: sb.inodes_count,
            block_size: sb.block_size(),
            inode_size: sb.inode_size,
            blocks_per_group: sb.blocks_per_group,
            inodes_per_group: sb.inodes_per_group,
            first_ino: sb.first_ino,
        })?;
        Ok(sb)
    }

    // -------------------------------------------------------------------------
    // Etapa 2: descriptor de grupo
    // -------------------------------------------------------------------------

    fn read_group(&mut self, sb: &Superblock, group: u32) -> Result<GroupDescriptor> {
        let offset = sb.group_table_offset() + group as u64 * GROUP_DESC_SIZE as u64;
        let raw = self
            .image
            .read_record("descriptor de grupo", offset, GROUP_DESC_SIZE)?;
        let gd = GroupDescriptor::parse(&raw)?;

        debug!(group, ?gd, "descriptor de grupo");

        self.emit(Record::Group {
            index: group,
            blocks: sb.blocks_in_group(group),
            inodes: sb.inodes_per_group,
            free_blocks: gd.free_blocks_count,
            free_inodes: gd.free_inodes_count,
            block_bitmap: gd.block_bitmap,
            inode_bitmap: gd.inode_bitmap,
            inode_table: gd.inode_table,
        })?;
        Ok(gd)
    }

    // -------------------------------------------------------------------------
    // Etapa 3: bitmaps
    // -------------------------------------------------------------------------

    /// El buffer vive solo mientras se recorre este grupo.
    fn read_bitmap(&self, sb: &Superblock, what: &'static str, block: u32) -> Result<Bitmap> {
        let block_size = sb.block_size();
        let raw = self
            .image
            .read_record(what, block as u64 * block_size as u64, block_size as usize)?;
        Ok(Bitmap::new(raw))
    }

    fn scan_block_bitmap(&mut self, sb: &Superblock, group: u32, gd: &GroupDescriptor) -> Result<()> {
        let bitmap = self.read_bitmap(sb, "bitmap de bloques", gd.block_bitmap)?;
        for bit in bitmap.free_positions(sb.blocks_per_group as usize) {
            self.emit(Record::BlockFree(free_block_number(
                group,
                sb.blocks_per_group,
                bit,
            )))?;
        }
        Ok(())
    }

    fn scan_inode_bitmap(&mut self, sb: &Superblock, gd: &GroupDescriptor) -> Result<()> {
        let bitmap = self.read_bitmap(sb, "bitmap de inodos", gd.inode_bitmap)?;
        for bit in bitmap.free_positions(sb.inodes_per_group as usize) {
            self.emit(Record::InodeFree(free_inode_number(bit)))?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Etapa 4: tabla de inodos
    // -------------------------------------------------------------------------

    fn walk_inode_table(&mut self, sb: &Superblock, group: u32, gd: &GroupDescriptor) -> Result<()> {
        let table = gd.inode_table as u64 * sb.block_size() as u64;
        let inode_size = sb.inode_size as usize;

        for slot in 0..sb.inodes_per_group {
            let offset = table + slot as u64 * inode_size as u64;
            let raw = self.image.read_record("inodo", offset, inode_size)?;
            let inode = Inode::parse(&raw)?;

            if inode.is_unallocated() {
                continue;
            }

            let number = group as u64 * sb.inodes_per_group as u64 + slot as u64 + 1;
            self.summarize_inode(number, &inode)?;

            if inode.is_dir() {
                self.walk_directory(sb, number, &inode)?;
            }
        }
        Ok(())
    }

    fn summarize_inode(&mut self, number: u64, inode: &Inode) -> Result<()> {
        self.emit(Record::Inode {
            number,
            kind: inode.kind(),
            mode: inode.permission_bits(),
            uid: inode.uid,
            gid: inode.gid,
            links: inode.links_count,
            ctime: inode.ctime,
            mtime: inode.mtime,
            atime: inode.atime,
            size: inode.size,
            blocks: inode.blocks,
            pointers: inode.listed_blocks(),
        })
    }

    // -------------------------------------------------------------------------
    // Etapa 5: entradas de directorio (solo bloques directos)
    // -------------------------------------------------------------------------

    fn walk_directory(&mut self, sb: &Superblock, owner: u64, inode: &Inode) -> Result<()> {
        let block_size = sb.block_size() as usize;
        let mut cumulative = 0u64;

        for &ptr in inode.direct_blocks() {
            if ptr == 0 {
                continue;
            }
            if ptr >= sb.blocks_count {
                warn!(owner, ptr, "puntero de directorio fuera del filesystem");
            }

            let base = ptr as u64 * block_size as u64;
            let block = self
                .image
                .read_record("bloque de directorio", base, block_size)?;

            let mut in_block = 0usize;
            while in_block < block_size {
                let entry = match dir_entry::decode(&block, in_block) {
                    Ok(DirSlot::Entry(entry)) => entry,
                    // Fin de entradas: se corta el directorio completo
                    Ok(DirSlot::End) => return Ok(()),
                    Err(detail) => {
                        return Err(DumpError::CorruptDirEntry {
                            inode: owner,
                            offset: base + in_block as u64,
                            detail,
                        })
                    }
                };

                if entry.is_misaligned() {
                    warn!(owner, rec_len = entry.rec_len, "rec_len sin alinear");
                }

                self.emit(Record::DirEntry {
                    owner,
                    offset: cumulative,
                    inode: entry.inode,
                    rec_len: entry.rec_len,
                    name_len: entry.name_len,
                    name: entry.name,
                })?;

                cumulative += entry.rec_len as u64;
                in_block += entry.rec_len as usize;
            }
        }
        Ok(())
    }
}

/// Atajo: vuelca `image` completa en `out`.
pub fn dump<R: ImageReader, W: Write>(image: R, out: W) -> Result<()> {
    Dumper::new(image, out).run()
}
