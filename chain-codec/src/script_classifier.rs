//! Pure pattern-matching classification of output scripts into the
//! closed `ScriptType` taxonomy (spec §4.B). The classifier never
//! touches the UTXO map; nested-SegWit detection on the *spending* side
//! is driven by the caller supplying the relevant script_sig/witness.

use chain_types::{Script, ScriptType};

const OP_0: u8 = 0x00;
const OP_PUSHDATA1: u8 = 0x4c;
const OP_PUSHDATA2: u8 = 0x4d;
const OP_PUSHDATA4: u8 = 0x4e;
const OP_1NEGATE: u8 = 0x4f;
const OP_1: u8 = 0x51;
const OP_16: u8 = 0x60;
const OP_DUP: u8 = 0x76;
const OP_EQUAL: u8 = 0x87;
const OP_EQUALVERIFY: u8 = 0x88;
const OP_HASH160: u8 = 0xa9;
const OP_CHECKSIG: u8 = 0xac;
const OP_RETURN: u8 = 0x6a;
const OP_CHECKMULTISIG: u8 = 0xae;

const COMPRESSED_KEY_LEN: usize = 33;
const UNCOMPRESSED_KEY_LEN: usize = 65;

/// Classify a `script_pubkey` at output-creation time. `script_sig` and
/// `witness` are `None` here: this is the creation-side classification
/// that spec §3 calls `created_type`, computed from the pubkey script
/// alone.
pub fn classify_created(script: &Script) -> ScriptType {
    classify(script, None, None)
}

/// Classify the script an input spends, given the script it resolved to
/// in the UTXO map plus the spending input's own script_sig/witness —
/// needed to detect nested SegWit (P2SH-wrapped P2WPKH/P2WSH) and
/// witness-script multisig, which are only visible from the spending
/// side.
pub fn classify_spent(prev_script: &Script, script_sig: &Script, witness: Option<&[Vec<u8>]>) -> ScriptType {
    classify(prev_script, Some(script_sig), witness)
}

fn classify(script: &Script, script_sig: Option<&Script>, witness: Option<&[Vec<u8>]>) -> ScriptType {
    let bytes = script.as_bytes();

    if is_p2pkh(bytes) {
        return ScriptType::P2pkh;
    }

    if is_p2sh(bytes) {
        if let Some(sig) = script_sig {
            if let Some(redeem) = extract_redeem_script(sig.as_bytes()) {
                if is_p2wpkh(&redeem) {
                    return ScriptType::P2shP2wpkh;
                }
                if is_p2wsh(&redeem) {
                    return match witness.and_then(|w| w.last()).and_then(multisig_arity) {
                        Some((m, n)) => ScriptType::P2shP2wshMultisig(m, n),
                        None => ScriptType::P2shP2wsh,
                    };
                }
                if let Some((m, n)) = multisig_arity(&redeem) {
                    return ScriptType::P2shMultisig(m, n);
                }
            }
        }
        return ScriptType::P2sh;
    }

    if is_op_return(bytes) {
        return ScriptType::OpReturn;
    }

    if is_p2wpkh(bytes) {
        return ScriptType::P2wpkh;
    }

    if is_p2wsh(bytes) {
        return match witness.and_then(|w| w.last()).and_then(multisig_arity) {
            Some((m, n)) => ScriptType::P2wshMultisig(m, n),
            None => ScriptType::P2wsh,
        };
    }

    if is_p2w_unknown(bytes) {
        return ScriptType::P2wUnknown;
    }

    if is_p2upk(bytes) {
        return ScriptType::P2upk;
    }

    if is_p2cpk(bytes) {
        return ScriptType::P2cpk;
    }

    if let Some((m, n)) = multisig_arity(bytes) {
        return ScriptType::Multisig(m, n);
    }

    ScriptType::Nonstandard
}

fn is_p2pkh(b: &[u8]) -> bool {
    b.len() == 25
        && b[0] == OP_DUP
        && b[1] == OP_HASH160
        && b[2] == 20
        && b[23] == OP_EQUALVERIFY
        && b[24] == OP_CHECKSIG
}

fn is_p2sh(b: &[u8]) -> bool {
    b.len() == 23 && b[0] == OP_HASH160 && b[1] == 20 && b[22] == OP_EQUAL
}

fn is_p2wpkh(b: &[u8]) -> bool {
    b.len() == 22 && b[0] == OP_0 && b[1] == 20
}

fn is_p2wsh(b: &[u8]) -> bool {
    b.len() == 34 && b[0] == OP_0 && b[1] == 32
}

fn is_p2w_unknown(b: &[u8]) -> bool {
    (4..=42).contains(&b.len()) && (OP_1..=OP_16).contains(&b[0]) && b[1] as usize + 2 == b.len()
}

fn is_p2upk(b: &[u8]) -> bool {
    b.len() == UNCOMPRESSED_KEY_LEN + 2
        && b[0] as usize == UNCOMPRESSED_KEY_LEN
        && b[1 + UNCOMPRESSED_KEY_LEN] == OP_CHECKSIG
}

fn is_p2cpk(b: &[u8]) -> bool {
    b.len() == COMPRESSED_KEY_LEN + 2
        && b[0] as usize == COMPRESSED_KEY_LEN
        && b[1 + COMPRESSED_KEY_LEN] == OP_CHECKSIG
}

fn is_op_return(b: &[u8]) -> bool {
    if b.is_empty() || b[0] != OP_RETURN {
        return false;
    }
    let mut pos = 1usize;
    while pos < b.len() {
        let item = b[pos];
        if item > OP_16 {
            return false;
        } else if item == OP_1NEGATE || item == OP_0 || (OP_1..=OP_16).contains(&item) {
            pos += 1;
        } else if item == OP_PUSHDATA1 {
            pos += 1;
            let Some(&n) = b.get(pos) else { return false };
            pos += 1 + n as usize;
        } else if item == OP_PUSHDATA2 {
            pos += 1;
            let Some(n) = b.get(pos..pos + 2) else { return false };
            pos += 2 + u16::from_le_bytes([n[0], n[1]]) as usize;
        } else if item == OP_PUSHDATA4 {
            pos += 1;
            let Some(n) = b.get(pos..pos + 4) else { return false };
            pos += 4 + u32::from_le_bytes([n[0], n[1], n[2], n[3]]) as usize;
        } else {
            pos += 1 + item as usize;
        }
    }
    pos == b.len()
}

/// `OP_m <key>+ OP_n OP_CHECKMULTISIG`, `1 <= m <= n <= 16`, each key
/// a valid compressed (33 B, prefix 2/3) or uncompressed (65 B, prefix
/// 4/6/7) SEC-encoded public key. Returns `(m, n)` on a match.
fn multisig_arity(b: &[u8]) -> Option<(u8, u8)> {
    if b.len() < 3 {
        return None;
    }
    if !(OP_1..=OP_16).contains(&b[0]) {
        return None;
    }
    let m = b[0] - OP_1 + 1;

    let mut pos = 1usize;
    while pos < b.len().saturating_sub(2) {
        let key_len = *b.get(pos)? as usize;
        pos += 1;
        if key_len == 0 {
            return None;
        }
        let key = b.get(pos..pos + key_len)?;
        pos += key_len;
        match key[0] {
            2 | 3 if key_len == COMPRESSED_KEY_LEN => {}
            4 | 6 | 7 if key_len == UNCOMPRESSED_KEY_LEN => {}
            _ => return None,
        }
    }

    if pos != b.len() - 2 {
        return None;
    }
    let n_byte = b[pos];
    if !(OP_1..=OP_16).contains(&n_byte) {
        return None;
    }
    let n = n_byte - OP_1 + 1;
    if n < m {
        return None;
    }
    if b[pos + 1] != OP_CHECKMULTISIG {
        return None;
    }
    Some((m, n))
}

/// Walk a script_sig's push opcodes and return the *last* pushed
/// payload — the redeem script, per spec's glossary.
fn extract_redeem_script(b: &[u8]) -> Option<Vec<u8>> {
    let mut pos = 0usize;
    let mut last: Option<Vec<u8>> = None;
    while pos < b.len() {
        let item = b[pos];
        pos += 1;
        if item > OP_PUSHDATA4 {
            // Not a push opcode; skip (mirrors the reference behaviour
            // of only tracking push-data items while walking script_sig).
            continue;
        }
        let payload = if item == OP_PUSHDATA1 {
            let n = *b.get(pos)? as usize;
            pos += 1;
            let data = b.get(pos..pos + n)?.to_vec();
            pos += n;
            data
        } else if item == OP_PUSHDATA2 {
            let n = u16::from_le_bytes([*b.get(pos)?, *b.get(pos + 1)?]) as usize;
            pos += 2;
            let data = b.get(pos..pos + n)?.to_vec();
            pos += n;
            data
        } else if item == OP_PUSHDATA4 {
            let n = u32::from_le_bytes([
                *b.get(pos)?,
                *b.get(pos + 1)?,
                *b.get(pos + 2)?,
                *b.get(pos + 3)?,
            ]) as usize;
            pos += 4;
            let data = b.get(pos..pos + n)?.to_vec();
            pos += n;
            data
        } else if item == OP_0 {
            vec![]
        } else if item == OP_1NEGATE {
            vec![0x81]
        } else if (OP_1..=OP_16).contains(&item) {
            vec![item - OP_1 + 1]
        } else {
            let n = item as usize;
            let data = b.get(pos..pos + n)?.to_vec();
            pos += n;
            data
        };
        last = Some(payload);
    }
    if pos != b.len() {
        return None;
    }
    last
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_types::Script;

    fn script(hex_str: &str) -> Script {
        Script::new(hex::decode(hex_str).unwrap())
    }

    #[test]
    fn classifies_p2pkh() {
        let s = script("76a91489abcdefabbaabbaabbaabbaabbaabbaabbaabba88ac");
        assert_eq!(classify_created(&s), ScriptType::P2pkh);
    }

    #[test]
    fn classifies_p2sh() {
        let s = script("a91489abcdefabbaabbaabbaabbaabbaabbaabbaabba87");
        assert_eq!(classify_created(&s), ScriptType::P2sh);
    }

    #[test]
    fn classifies_p2wpkh() {
        let s = script(&format!("0014{}", "ab".repeat(20)));
        assert_eq!(classify_created(&s), ScriptType::P2wpkh);
    }

    #[test]
    fn classifies_op_return() {
        let s = script(&format!("6a0b{}", "00".repeat(11)));
        assert_eq!(classify_created(&s), ScriptType::OpReturn);
    }

    #[test]
    fn classifies_multisig_2_of_3() {
        let key = "02".to_string() + &"11".repeat(32);
        let data = format!("52{}{}{}53ae", key, key, key);
        let s = script(&data);
        assert_eq!(classify_created(&s), ScriptType::Multisig(2, 3));
    }

    #[test]
    fn classifies_nonstandard_fallback() {
        let s = script("6051");
        assert_eq!(classify_created(&s), ScriptType::Nonstandard);
    }

    #[test]
    fn nested_p2sh_p2wpkh() {
        // script_sig: push 22-byte redeem script 0014<20-byte hash>.
        let redeem = format!("0014{}", "ab".repeat(20));
        let sig_bytes = format!("16{redeem}"); // 0x16 = 22, push redeem script
        let sig = script(&sig_bytes);
        let prev = script(&format!("a914{}87", "cd".repeat(20)));
        assert_eq!(
            classify_spent(&prev, &sig, None),
            ScriptType::P2shP2wpkh
        );
    }
}
