#![no_main]
use libfuzzer_sys::fuzz_target;
use mossl_codec::dynbuf::DynBuf;
use mossl_codec::parse::ParseBuf;

// Interpret the input as a small op program against a DynBuf, then check
// that whatever was built parses back as a TLV stream when tagged.
fuzz_target!(|data: &[u8]| {
    let mut ops = data.iter().copied();
    let mut db = DynBuf::with_capacity(usize::from(ops.next().unwrap_or(0)));
    let mut seq = db.begin_constructed();
    while let Some(op) = ops.next() {
        match op % 5 {
            0 => {
                let n = usize::from(ops.next().unwrap_or(0));
                let chunk: Vec<u8> = ops.by_ref().take(n).collect();
                seq.append_bytes(&chunk);
            }
            1 => {
                let ch = u32::from_le_bytes([
                    ops.next().unwrap_or(0),
                    ops.next().unwrap_or(0),
                    ops.next().unwrap_or(0),
                    0,
                ]);
                seq.append_utf8(ch);
            }
            2 => {
                let tag = ops.next().unwrap_or(0x04);
                let n = usize::from(ops.next().unwrap_or(0));
                let content: Vec<u8> = ops.by_ref().take(n).collect();
                seq.append_tlv(tag, &content);
            }
            3 => {
                let n = usize::from(ops.next().unwrap_or(0));
                if let Some(dst) = seq.prepend(n) {
                    dst.fill(0x41);
                }
            }
            _ => {
                let mut inner = seq.begin_constructed();
                let n = usize::from(ops.next().unwrap_or(0));
                let chunk: Vec<u8> = ops.by_ref().take(n).collect();
                inner.append_bytes(&chunk);
                let _ = inner.end_constructed(0x31);
            }
        }
    }
    let _ = seq.end_constructed(0x30);
    if let Ok(out) = db.detach() {
        let mut pb = ParseBuf::new(&out);
        let sub = pb.read_sub(0x30);
        let _ = sub.finish();
    }
});
