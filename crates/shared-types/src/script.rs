//! Script byte helpers needed by consensus rules.
//!
//! Only opcode walking is provided (push skipping, signature-operation
//! counting, height pushes). Script execution lives elsewhere.

pub const OP_0: u8 = 0x00;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_PUSHDATA4: u8 = 0x4e;
pub const OP_1: u8 = 0x51;
pub const OP_TRUE: u8 = OP_1;
pub const OP_CHECKSIG: u8 = 0xac;
pub const OP_CHECKSIGVERIFY: u8 = 0xad;
pub const OP_CHECKMULTISIG: u8 = 0xae;
pub const OP_CHECKMULTISIGVERIFY: u8 = 0xaf;

/// Signature operations a bare multisig is charged when counted without
/// looking at the preceding key-count opcode.
pub const MAX_PUBKEYS_PER_MULTISIG: usize = 20;

/// Minimal little-endian script-number encoding of a non-negative value.
fn script_num(mut value: u64) -> Vec<u8> {
    let mut out = Vec::new();
    while value > 0 {
        out.push((value & 0xff) as u8);
        value >>= 8;
    }
    // Keep the number positive if the top bit would read as a sign.
    if out.last().is_some_and(|b| b & 0x80 != 0) {
        out.push(0x00);
    }
    out
}

/// The script a coinbase must start with once height commitments are
/// enforced: the height pushed as a script number.
pub fn height_script(height: u64) -> Vec<u8> {
    match height {
        0 => vec![OP_0],
        1..=16 => vec![OP_1 + (height as u8 - 1)],
        _ => {
            let num = script_num(height);
            let mut script = Vec::with_capacity(num.len() + 1);
            script.push(num.len() as u8);
            script.extend_from_slice(&num);
            script
        }
    }
}

/// Count signature operations the legacy way: `CHECKSIG` counts one,
/// `CHECKMULTISIG` counts the maximum key count. Counting stops at the first
/// truncated push.
pub fn legacy_sigop_count(script: &[u8]) -> usize {
    let mut count = 0;
    let mut pc = 0;

    while pc < script.len() {
        let opcode = script[pc];
        pc += 1;

        if opcode <= OP_PUSHDATA4 {
            let (len_bytes, push_len) = match opcode {
                OP_PUSHDATA1 => (1, read_le(script, pc, 1)),
                OP_PUSHDATA2 => (2, read_le(script, pc, 2)),
                OP_PUSHDATA4 => (4, read_le(script, pc, 4)),
                n => (0, Some(n as usize)),
            };
            let Some(push_len) = push_len else { break };
            pc += len_bytes;
            if pc + push_len > script.len() {
                break;
            }
            pc += push_len;
            continue;
        }

        match opcode {
            OP_CHECKSIG | OP_CHECKSIGVERIFY => count += 1,
            OP_CHECKMULTISIG | OP_CHECKMULTISIGVERIFY => count += MAX_PUBKEYS_PER_MULTISIG,
            _ => {}
        }
    }

    count
}

fn read_le(script: &[u8], at: usize, width: usize) -> Option<usize> {
    let bytes = script.get(at..at + width)?;
    Some(
        bytes
            .iter()
            .rev()
            .fold(0usize, |acc, b| (acc << 8) | usize::from(*b)),
    )
}
