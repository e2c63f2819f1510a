//! The closed script-type taxonomy and a thin byte-slice wrapper around
//! output/redeem/witness scripts.
//!
//! `Script` never owns a parsed AST: pattern matching works directly over
//! the raw bytes, the same way the node itself treats scripts as opaque
//! blobs until a specific shape is tested for.

use bitcoin::ScriptBuf;

/// The closed set of script shapes the pipeline recognises. Multisig
/// variants carry their (m, n) arity so metric emission can append the
/// `-m-of-n` suffix without re-parsing the script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptType {
    Coinbase,
    P2upk,
    P2cpk,
    P2pkh,
    P2sh,
    P2shMultisig(u8, u8),
    Multisig(u8, u8),
    OpReturn,
    P2wpkh,
    P2shP2wpkh,
    P2wsh,
    P2wshMultisig(u8, u8),
    P2shP2wsh,
    P2shP2wshMultisig(u8, u8),
    P2wUnknown,
    Nonstandard,
}

impl ScriptType {
    /// Metric-family name, e.g. `P2SH_MULTISIG` gains a `-2-of-3` suffix.
    /// This is the single place string tags are produced; the classifier
    /// and UTXO map never carry strings on the hot path.
    pub fn metric_suffix(&self) -> String {
        match self {
            ScriptType::Coinbase => "COINBASE".to_string(),
            ScriptType::P2upk => "P2UPK".to_string(),
            ScriptType::P2cpk => "P2CPK".to_string(),
            ScriptType::P2pkh => "P2PKH".to_string(),
            ScriptType::P2sh => "P2SH".to_string(),
            ScriptType::P2shMultisig(m, n) => format!("P2SH_MULTISIG-{m}-of-{n}"),
            ScriptType::Multisig(m, n) => format!("MULTISIG-{m}-of-{n}"),
            ScriptType::OpReturn => "OP_RETURN".to_string(),
            ScriptType::P2wpkh => "P2WPKH".to_string(),
            ScriptType::P2shP2wpkh => "P2SH_P2WPKH".to_string(),
            ScriptType::P2wsh => "P2WSH".to_string(),
            ScriptType::P2wshMultisig(m, n) => format!("P2WSH_MULTISIG-{m}-of-{n}"),
            ScriptType::P2shP2wsh => "P2SH_P2WSH".to_string(),
            ScriptType::P2shP2wshMultisig(m, n) => format!("P2SH_P2WSH_MULTISIG-{m}-of-{n}"),
            ScriptType::P2wUnknown => "P2W_UNKNOWN".to_string(),
            ScriptType::Nonstandard => "NONSTANDARD".to_string(),
        }
    }

    pub fn is_multisig(&self) -> bool {
        matches!(
            self,
            ScriptType::Multisig(..)
                | ScriptType::P2shMultisig(..)
                | ScriptType::P2wshMultisig(..)
                | ScriptType::P2shP2wshMultisig(..)
        )
    }
}

/// A thin wrapper over the output script's raw bytes. Held as a
/// `ScriptBuf` so the classifier can reuse its byte accessors without
/// introducing a second script representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script(ScriptBuf);

impl Script {
    pub fn new(bytes: Vec<u8>) -> Self {
        Script(ScriptBuf::from_bytes(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_script_buf(self) -> ScriptBuf {
        self.0
    }
}

impl From<ScriptBuf> for Script {
    fn from(buf: ScriptBuf) -> Self {
        Script(buf)
    }
}

impl From<Vec<u8>> for Script {
    fn from(bytes: Vec<u8>) -> Self {
        Script::new(bytes)
    }
}
