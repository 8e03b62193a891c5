//! Raw Input HID packet parsing.
//!
//! Parses the byte layout `GetRawInputData` / `GetRawInputBuffer` hand back
//! (`RAWINPUTHEADER` followed by `RAWHID`) without touching the OS, so the
//! same code serves both pump variants and runs in tests.
//!
//! ```text
//! RAWINPUTHEADER  dwType:u32  dwSize:u32  hDevice:ptr  wParam:ptr
//! RAWHID          dwSizeHid:u32  dwCount:u32  bRawData[dwSizeHid * dwCount]
//! ```
//!
//! Only `RIM_TYPEHID` packets are returned; keyboard and mouse packets are
//! skipped. Blocks in a `GetRawInputBuffer` batch are pointer-size aligned
//! (`NEXTRAWINPUTBLOCK`).

use core::mem::size_of;

/// `RAWINPUTHEADER::dwType` value for HID devices.
pub const RIM_TYPEHID: u32 = 2;

/// Size of `RAWINPUTHEADER` for the running process.
pub const HEADER_LEN: usize = 8 + 2 * size_of::<usize>();

/// `dwSizeHid` + `dwCount`.
const RAWHID_PREFIX_LEN: usize = 8;

/// One HID packet borrowed from a Raw Input buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HidPacket<'a> {
    /// Raw Input device handle (`hDevice`) as an integer.
    pub device: usize,
    /// Size of one report.
    pub size_hid: usize,
    /// `size_hid * count` bytes (clamped to what the block actually holds).
    pub data: &'a [u8],
}

impl<'a> HidPacket<'a> {
    /// The individual reports, oldest first. Raw Input may batch several.
    pub fn reports(&self) -> impl Iterator<Item = &'a [u8]> {
        let size = self.size_hid.max(1);
        let data = if self.size_hid == 0 { &[][..] } else { self.data };
        data.chunks_exact(size)
    }
}

#[inline]
fn read_u32(buf: &[u8], at: usize) -> Option<u32> {
    let bytes = buf.get(at..at + 4)?;
    Some(u32::from_ne_bytes(bytes.try_into().ok()?))
}

#[inline]
fn read_usize(buf: &[u8], at: usize) -> Option<usize> {
    const N: usize = size_of::<usize>();
    let bytes = buf.get(at..at + N)?;
    Some(usize::from_ne_bytes(bytes.try_into().ok()?))
}

/// `dwSize` of the block starting at `buf[0]`, if the header is present.
fn block_size(buf: &[u8]) -> Option<usize> {
    read_u32(buf, 4).map(|s| s as usize)
}

/// Parse one `RAWINPUT` block. Returns `None` for non-HID or truncated input.
pub fn parse_block(buf: &[u8]) -> Option<HidPacket<'_>> {
    if buf.len() < HEADER_LEN + RAWHID_PREFIX_LEN {
        return None;
    }
    if read_u32(buf, 0)? != RIM_TYPEHID {
        return None;
    }
    let dw_size = block_size(buf)?.min(buf.len());
    let device = read_usize(buf, 8)?;

    let size_hid = read_u32(buf, HEADER_LEN)? as usize;
    let count = read_u32(buf, HEADER_LEN + 4)? as usize;

    let start = HEADER_LEN + RAWHID_PREFIX_LEN;
    let available = dw_size.saturating_sub(start);
    let len = size_hid.saturating_mul(count).min(available);

    Some(HidPacket {
        device,
        size_hid,
        data: &buf[start..start + len],
    })
}

/// Round `n` up to the Raw Input block alignment.
#[inline]
pub fn align_block(n: usize) -> usize {
    const A: usize = size_of::<usize>();
    (n + A - 1) & !(A - 1)
}

/// Byte offsets of the first `count` blocks in a `GetRawInputBuffer` batch.
///
/// Stops early if a block header is truncated or reports a zero size.
pub fn block_offsets(buf: &[u8], count: usize) -> Vec<usize> {
    let mut out = Vec::with_capacity(count);
    let mut at = 0usize;
    while out.len() < count {
        let Some(size) = buf.get(at..).and_then(block_size) else {
            break;
        };
        if size < HEADER_LEN {
            break;
        }
        out.push(at);
        at = align_block(at + size);
    }
    out
}

/// Uppercase hex dump of `bytes`, no separators.
pub fn hex(bytes: &[u8]) -> String {
    const DIGITS: &[u8; 16] = b"0123456789ABCDEF";
    let mut s = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        s.push(DIGITS[(b >> 4) as usize] as char);
        s.push(DIGITS[(b & 0x0F) as usize] as char);
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(kind: u32, device: usize, size_hid: u32, reports: &[&[u8]]) -> Vec<u8> {
        let payload: Vec<u8> = reports.iter().flat_map(|r| r.iter().copied()).collect();
        let dw_size = (HEADER_LEN + RAWHID_PREFIX_LEN + payload.len()) as u32;

        let mut b = Vec::new();
        b.extend_from_slice(&kind.to_ne_bytes());
        b.extend_from_slice(&dw_size.to_ne_bytes());
        b.extend_from_slice(&device.to_ne_bytes());
        b.extend_from_slice(&0usize.to_ne_bytes());
        b.extend_from_slice(&size_hid.to_ne_bytes());
        b.extend_from_slice(&(reports.len() as u32).to_ne_bytes());
        b.extend_from_slice(&payload);
        b
    }

    #[test]
    fn parses_single_hid_block() {
        let raw = block(RIM_TYPEHID, 0xABCD, 4, &[&[1, 0x80, 0x7F, 0x0F]]);
        let p = parse_block(&raw).unwrap();
        assert_eq!(p.device, 0xABCD);
        assert_eq!(p.size_hid, 4);
        assert_eq!(p.reports().collect::<Vec<_>>(), vec![&[1u8, 0x80, 0x7F, 0x0F][..]]);
    }

    #[test]
    fn splits_batched_reports() {
        let raw = block(RIM_TYPEHID, 1, 2, &[&[1, 2], &[3, 4], &[5, 6]]);
        let p = parse_block(&raw).unwrap();
        assert_eq!(p.reports().count(), 3);
        assert_eq!(p.reports().last(), Some(&[5u8, 6][..]));
    }

    #[test]
    fn skips_keyboard_and_truncated_blocks() {
        assert!(parse_block(&block(1, 1, 2, &[&[1, 2]])).is_none());
        assert!(parse_block(&[0u8; 6]).is_none());

        // dwCount claims more than the block holds: clamp to what is there.
        let mut raw = block(RIM_TYPEHID, 1, 4, &[&[9, 9, 9, 9]]);
        raw[HEADER_LEN + 4..HEADER_LEN + 8].copy_from_slice(&5u32.to_ne_bytes());
        let p = parse_block(&raw).unwrap();
        assert_eq!(p.data.len(), 4);
        assert_eq!(p.reports().count(), 1);
    }

    #[test]
    fn zero_sized_reports_yield_nothing() {
        let raw = block(RIM_TYPEHID, 1, 0, &[]);
        assert_eq!(parse_block(&raw).unwrap().reports().count(), 0);
    }

    #[test]
    fn alignment_is_pointer_sized() {
        let a = size_of::<usize>();
        assert_eq!(align_block(0), 0);
        assert_eq!(align_block(1), a);
        assert_eq!(align_block(a), a);
        assert_eq!(align_block(a + 1), 2 * a);
    }

    #[test]
    fn walks_aligned_batch() {
        let first = block(RIM_TYPEHID, 1, 3, &[&[1, 2, 3]]);
        let second = block(RIM_TYPEHID, 2, 2, &[&[4, 5]]);

        let mut buf = first.clone();
        buf.resize(align_block(first.len()), 0);
        let second_at = buf.len();
        buf.extend_from_slice(&second);

        let offsets = block_offsets(&buf, 2);
        assert_eq!(offsets, vec![0, second_at]);
        assert_eq!(parse_block(&buf[second_at..]).unwrap().device, 2);

        // Asking for more blocks than present stops at the end.
        buf.resize(align_block(buf.len()), 0);
        assert_eq!(block_offsets(&buf, 5).len(), 2);
    }

    #[test]
    fn hex_dump_is_uppercase() {
        assert_eq!(hex(&[0x00, 0xAB, 0x7f]), "00AB7F");
    }
}
