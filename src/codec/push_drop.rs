//! Push-drop locking-script template.
//!
//! Layout: `<33-byte pubkey> OP_CHECKSIG <field pushes...> OP_2DROP... [OP_DROP]`.
//! The fields are dropped before the signature check, so the output is
//! spendable by the key holder while carrying arbitrary data.

use super::{CodecError, FieldDecoder};

const OP_0: u8 = 0x00;
const OP_PUSHDATA1: u8 = 0x4c;
const OP_PUSHDATA2: u8 = 0x4d;
const OP_PUSHDATA4: u8 = 0x4e;
const OP_1NEGATE: u8 = 0x4f;
const OP_1: u8 = 0x51;
const OP_16: u8 = 0x60;
const OP_2DROP: u8 = 0x6d;
const OP_DROP: u8 = 0x75;
const OP_CHECKSIG: u8 = 0xac;

const COMPRESSED_KEY_LEN: usize = 33;

/// One parsed script element.
#[derive(Debug, PartialEq, Eq)]
enum Chunk {
    Push(Vec<u8>),
    Op(u8),
}

/// Cursor over raw script bytes yielding [`Chunk`]s.
struct ScriptReader<'a> {
    script: &'a [u8],
    pos: usize,
}

impl<'a> ScriptReader<'a> {
    fn new(script: &'a [u8]) -> Self {
        Self { script, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        let start = self.pos;
        let end = start
            .checked_add(len)
            .ok_or(CodecError::TruncatedPush(start))?;
        let bytes = self
            .script
            .get(start..end)
            .ok_or(CodecError::TruncatedPush(start))?;
        self.pos = end;
        Ok(bytes)
    }

    fn take_len<const N: usize>(&mut self) -> Result<usize, CodecError> {
        let mut buf = [0u8; 8];
        let bytes = self.take(N)?;
        if let Some(dst) = buf.get_mut(..N) {
            dst.copy_from_slice(bytes);
        }
        usize::try_from(u64::from_le_bytes(buf)).map_err(|_| CodecError::TruncatedPush(self.pos))
    }

    fn next_chunk(&mut self) -> Option<Result<Chunk, CodecError>> {
        let opcode = *self.script.get(self.pos)?;
        self.pos += 1;
        let chunk = match opcode {
            OP_0 => Ok(Chunk::Push(Vec::new())),
            0x01..=0x4b => self.take(usize::from(opcode)).map(|b| Chunk::Push(b.to_vec())),
            OP_PUSHDATA1 => self
                .take_len::<1>()
                .and_then(|len| self.take(len))
                .map(|b| Chunk::Push(b.to_vec())),
            OP_PUSHDATA2 => self
                .take_len::<2>()
                .and_then(|len| self.take(len))
                .map(|b| Chunk::Push(b.to_vec())),
            OP_PUSHDATA4 => self
                .take_len::<4>()
                .and_then(|len| self.take(len))
                .map(|b| Chunk::Push(b.to_vec())),
            OP_1NEGATE => Ok(Chunk::Push(vec![0x81])),
            OP_1..=OP_16 => Ok(Chunk::Push(vec![opcode - OP_1 + 1])),
            other => Ok(Chunk::Op(other)),
        };
        Some(chunk)
    }
}

/// [`FieldDecoder`] for push-drop scripts with the lock before the fields.
///
/// `OP_0` decodes to an empty field so that optional fields left blank by the
/// author are seen as empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct PushDropDecoder;

impl PushDropDecoder {
    /// Creates the decoder.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl FieldDecoder for PushDropDecoder {
    fn decode(&self, script: &[u8]) -> Result<Vec<Vec<u8>>, CodecError> {
        let mut reader = ScriptReader::new(script);

        match reader.next_chunk().transpose()? {
            Some(Chunk::Push(key)) if key.len() == COMPRESSED_KEY_LEN => {}
            _ => return Err(CodecError::MissingLock),
        }
        if reader.next_chunk().transpose()? != Some(Chunk::Op(OP_CHECKSIG)) {
            return Err(CodecError::MissingLock);
        }

        let mut fields = Vec::new();
        let mut terminated = false;
        while let Some(chunk) = reader.next_chunk() {
            match chunk? {
                Chunk::Push(data) if !terminated => fields.push(data),
                Chunk::Op(OP_DROP | OP_2DROP) => terminated = true,
                Chunk::Op(op) => return Err(CodecError::UnexpectedOpcode(op)),
                Chunk::Push(_) => return Err(CodecError::TrailingData),
            }
        }

        if fields.is_empty() {
            return Err(CodecError::NoFields);
        }
        if !terminated {
            return Err(CodecError::MissingDrop);
        }
        Ok(fields)
    }
}

/// Builds a push-drop locking script with minimal pushes.
///
/// Inverse of [`PushDropDecoder::decode`] for keys of 33 bytes.
#[must_use]
pub fn encode_push_drop(locking_key: &[u8], fields: &[Vec<u8>]) -> Vec<u8> {
    let mut script = Vec::new();
    push_data(&mut script, locking_key);
    script.push(OP_CHECKSIG);
    for field in fields {
        push_minimal(&mut script, field);
    }
    for _ in 0..fields.len() / 2 {
        script.push(OP_2DROP);
    }
    if fields.len() % 2 == 1 {
        script.push(OP_DROP);
    }
    script
}

fn push_minimal(script: &mut Vec<u8>, data: &[u8]) {
    match data {
        [] => script.push(OP_0),
        [n @ 1..=16] => script.push(OP_1 + n - 1),
        [0x81] => script.push(OP_1NEGATE),
        _ => push_data(script, data),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn push_data(script: &mut Vec<u8>, data: &[u8]) {
    let len = data.len();
    if len <= 0x4b {
        script.push(len as u8);
    } else if len <= 0xff {
        script.push(OP_PUSHDATA1);
        script.push(len as u8);
    } else if len <= 0xffff {
        script.push(OP_PUSHDATA2);
        script.extend_from_slice(&(len as u16).to_le_bytes());
    } else {
        script.push(OP_PUSHDATA4);
        script.extend_from_slice(&(len as u32).to_le_bytes());
    }
    script.extend_from_slice(data);
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    const KEY: [u8; 33] = [2u8; 33];

    fn fields(values: &[&[u8]]) -> Vec<Vec<u8>> {
        values.iter().map(|v| v.to_vec()).collect()
    }

    #[test]
    fn decodes_encoded_fields() {
        let input = fields(&[b"topic", b"rust", b"", &[7], &[0x81], &[0u8; 300]]);
        let script = encode_push_drop(&KEY, &input);
        let Ok(decoded) = PushDropDecoder.decode(&script) else {
            panic!("decode failed");
        };
        assert_eq!(decoded, input);
    }

    #[test]
    fn odd_field_count_ends_with_single_drop() {
        let script = encode_push_drop(&KEY, &fields(&[b"a", b"bb", b"ccc"]));
        assert_eq!(script.last(), Some(&OP_DROP));
        assert_eq!(script.iter().filter(|b| **b == OP_2DROP).count(), 1);
    }

    #[test]
    fn small_integers_use_number_opcodes() {
        let script = encode_push_drop(&KEY, &fields(&[&[16]]));
        assert_eq!(script.get(35), Some(&OP_16));
    }

    #[test]
    fn rejects_script_without_lock() {
        let script = [0x05, b'h', b'e', b'l', b'l', b'o', OP_DROP];
        assert_eq!(
            PushDropDecoder.decode(&script),
            Err(CodecError::MissingLock)
        );
    }

    #[test]
    fn rejects_missing_drop() {
        let mut script = encode_push_drop(&KEY, &fields(&[b"a", b"b"]));
        script.pop();
        assert_eq!(
            PushDropDecoder.decode(&script),
            Err(CodecError::MissingDrop)
        );
    }

    #[test]
    fn rejects_truncated_push() {
        let mut script = encode_push_drop(&KEY, &[]);
        script.extend_from_slice(&[0x10, 0x01, 0x02]);
        assert!(matches!(
            PushDropDecoder.decode(&script),
            Err(CodecError::TruncatedPush(_))
        ));
    }

    #[test]
    fn rejects_lock_without_fields() {
        let script = encode_push_drop(&KEY, &[]);
        assert_eq!(PushDropDecoder.decode(&script), Err(CodecError::NoFields));
    }

    #[test]
    fn rejects_p2pkh_script() {
        let mut script = vec![0x76, 0xa9, 0x14];
        script.extend_from_slice(&[0u8; 20]);
        script.extend_from_slice(&[0x88, 0xac]);
        assert!(PushDropDecoder.decode(&script).is_err());
    }

    #[test]
    fn rejects_opcode_inside_fields() {
        let mut script = encode_push_drop(&KEY, &[]);
        script.extend_from_slice(&[0x01, b'x', 0x76, OP_DROP]);
        assert_eq!(
            PushDropDecoder.decode(&script),
            Err(CodecError::UnexpectedOpcode(0x76))
        );
    }
}
