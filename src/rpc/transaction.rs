//! Legacy transaction wire format
//!
//! Just enough of the message layout to build, sign and serialize a
//! system-program transfer.

use crate::types::{Blockhash, Pubkey, Signature};
use crate::wallet::WalletKeypair;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

/// The system program id (all zeros)
pub const SYSTEM_PROGRAM_ID: Pubkey = Pubkey::NULL;

/// System program instruction index for `Transfer`
const SYSTEM_TRANSFER_INDEX: u32 = 2;

/// An account referenced by an instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountMeta {
    pub pubkey: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    pub fn new(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: true,
        }
    }

    pub fn new_readonly(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: false,
        }
    }
}

/// A program call before account keys are compiled to indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub program_id: Pubkey,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

/// `SystemProgram.transfer`: moves lamports from `from` to `to`
pub fn system_transfer(from: &Pubkey, to: &Pubkey, lamports: u64) -> Instruction {
    let mut data = Vec::with_capacity(12);
    data.extend_from_slice(&SYSTEM_TRANSFER_INDEX.to_le_bytes());
    data.extend_from_slice(&lamports.to_le_bytes());

    Instruction {
        program_id: SYSTEM_PROGRAM_ID,
        accounts: vec![AccountMeta::new(*from, true), AccountMeta::new(*to, false)],
        data,
    }
}

/// Append a compact-u16 length (1 to 3 bytes, 7 bits per byte)
pub fn encode_compact_u16(out: &mut Vec<u8>, value: u16) {
    let mut rem = value;
    loop {
        let mut byte = (rem & 0x7f) as u8;
        rem >>= 7;
        if rem == 0 {
            out.push(byte);
            break;
        }
        byte |= 0x80;
        out.push(byte);
    }
}

fn encode_len(out: &mut Vec<u8>, len: usize) {
    // Transfers never come close to the u16 limit
    encode_compact_u16(out, len.min(u16::MAX as usize) as u16);
}

/// Message header: how many of the leading keys sign, and how many are readonly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessageHeader {
    pub num_required_signatures: u8,
    pub num_readonly_signed_accounts: u8,
    pub num_readonly_unsigned_accounts: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub accounts: Vec<u8>,
    pub data: Vec<u8>,
}

/// A compiled legacy message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: MessageHeader,
    pub account_keys: Vec<Pubkey>,
    pub recent_blockhash: Blockhash,
    pub instructions: Vec<CompiledInstruction>,
}

impl Message {
    /// Compile instructions with `payer` as the fee payer.
    ///
    /// Keys are deduplicated with their signer/writable flags merged, then
    /// ordered: writable signers, readonly signers, writable non-signers,
    /// readonly non-signers. The payer is always first.
    pub fn new(instructions: &[Instruction], payer: &Pubkey, recent_blockhash: Blockhash) -> Self {
        let mut metas: Vec<AccountMeta> = vec![AccountMeta::new(*payer, true)];

        let mut merge = |meta: AccountMeta| {
            if let Some(existing) = metas.iter_mut().find(|m| m.pubkey == meta.pubkey) {
                existing.is_signer |= meta.is_signer;
                existing.is_writable |= meta.is_writable;
            } else {
                metas.push(meta);
            }
        };

        for ix in instructions {
            for meta in &ix.accounts {
                merge(meta.clone());
            }
            merge(AccountMeta::new_readonly(ix.program_id, false));
        }

        // Stable sort keeps first-seen order inside each group
        metas.sort_by_key(|m| match (m.is_signer, m.is_writable) {
            (true, true) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) => 3,
        });

        let header = MessageHeader {
            num_required_signatures: metas.iter().filter(|m| m.is_signer).count() as u8,
            num_readonly_signed_accounts: metas
                .iter()
                .filter(|m| m.is_signer && !m.is_writable)
                .count() as u8,
            num_readonly_unsigned_accounts: metas
                .iter()
                .filter(|m| !m.is_signer && !m.is_writable)
                .count() as u8,
        };

        let account_keys: Vec<Pubkey> = metas.into_iter().map(|m| m.pubkey).collect();
        let index_of = |key: &Pubkey| -> u8 {
            account_keys
                .iter()
                .position(|k| k == key)
                .unwrap_or_default() as u8
        };

        let instructions = instructions
            .iter()
            .map(|ix| CompiledInstruction {
                program_id_index: index_of(&ix.program_id),
                accounts: ix.accounts.iter().map(|m| index_of(&m.pubkey)).collect(),
                data: ix.data.clone(),
            })
            .collect();

        Self {
            header,
            account_keys,
            recent_blockhash,
            instructions,
        }
    }

    /// Wire bytes; this is what gets signed
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(3 + 1 + self.account_keys.len() * 32 + 32 + 32);
        out.push(self.header.num_required_signatures);
        out.push(self.header.num_readonly_signed_accounts);
        out.push(self.header.num_readonly_unsigned_accounts);

        encode_len(&mut out, self.account_keys.len());
        for key in &self.account_keys {
            out.extend_from_slice(key.as_bytes());
        }

        out.extend_from_slice(&self.recent_blockhash.0);

        encode_len(&mut out, self.instructions.len());
        for ix in &self.instructions {
            out.push(ix.program_id_index);
            encode_len(&mut out, ix.accounts.len());
            out.extend_from_slice(&ix.accounts);
            encode_len(&mut out, ix.data.len());
            out.extend_from_slice(&ix.data);
        }

        out
    }

    /// Base64 form expected by `getFeeForMessage`
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.serialize())
    }
}

/// A message plus its signatures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub signatures: Vec<Signature>,
    pub message: Message,
}

impl Transaction {
    /// Sign a single-signer message with the fee payer's keypair
    pub fn new_signed(message: Message, payer: &WalletKeypair) -> Self {
        let signature = payer.sign(&message.serialize());
        Self {
            signatures: vec![signature],
            message,
        }
    }

    /// The first signature identifies the transaction
    pub fn signature(&self) -> Option<&Signature> {
        self.signatures.first()
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        encode_len(&mut out, self.signatures.len());
        for sig in &self.signatures {
            out.extend_from_slice(&sig.0);
        }
        out.extend_from_slice(&self.message.serialize());
        out
    }

    /// Base64 form expected by `sendTransaction`
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.serialize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Verifier, VerifyingKey};

    fn compact(value: u16) -> Vec<u8> {
        let mut out = Vec::new();
        encode_compact_u16(&mut out, value);
        out
    }

    #[test]
    fn test_compact_u16() {
        assert_eq!(compact(0), vec![0x00]);
        assert_eq!(compact(0x7f), vec![0x7f]);
        assert_eq!(compact(0x80), vec![0x80, 0x01]);
        assert_eq!(compact(0x3fff), vec![0xff, 0x7f]);
        assert_eq!(compact(0x4000), vec![0x80, 0x80, 0x01]);
        assert_eq!(compact(u16::MAX), vec![0xff, 0xff, 0x03]);
    }

    #[test]
    fn test_transfer_instruction_data() {
        let ix = system_transfer(&Pubkey([1; 32]), &Pubkey([2; 32]), 1_500_000_000);
        assert_eq!(ix.data.len(), 12);
        assert_eq!(&ix.data[..4], &[2, 0, 0, 0]);
        assert_eq!(u64::from_le_bytes(ix.data[4..].try_into().unwrap()), 1_500_000_000);
    }

    #[test]
    fn test_transfer_message_layout() {
        let from = Pubkey([1; 32]);
        let to = Pubkey([2; 32]);
        let ix = system_transfer(&from, &to, 10);
        let msg = Message::new(&[ix], &from, Blockhash([9; 32]));

        assert_eq!(msg.account_keys, vec![from, to, SYSTEM_PROGRAM_ID]);
        assert_eq!(
            msg.header,
            MessageHeader {
                num_required_signatures: 1,
                num_readonly_signed_accounts: 0,
                num_readonly_unsigned_accounts: 1,
            }
        );
        assert_eq!(msg.instructions[0].program_id_index, 2);
        assert_eq!(msg.instructions[0].accounts, vec![0, 1]);

        let bytes = msg.serialize();
        assert_eq!(&bytes[..4], &[1, 0, 1, 3]);
        // header + keys + blockhash + ix count + program idx + 2 accounts + data
        assert_eq!(bytes.len(), 3 + 1 + 96 + 32 + 1 + 1 + 1 + 2 + 1 + 12);
    }

    #[test]
    fn test_transfer_to_null_address_merges_program_key() {
        let from = Pubkey([1; 32]);
        let ix = system_transfer(&from, &Pubkey::NULL, 10);
        let msg = Message::new(&[ix], &from, Blockhash::default());

        assert_eq!(msg.account_keys, vec![from, Pubkey::NULL]);
        assert_eq!(msg.header.num_readonly_unsigned_accounts, 0);
        assert_eq!(msg.instructions[0].program_id_index, 1);
        assert_eq!(msg.instructions[0].accounts, vec![0, 1]);
    }

    #[test]
    fn test_self_transfer() {
        let from = Pubkey([7; 32]);
        let ix = system_transfer(&from, &from, 10);
        let msg = Message::new(&[ix], &from, Blockhash::default());

        assert_eq!(msg.account_keys, vec![from, SYSTEM_PROGRAM_ID]);
        assert_eq!(msg.instructions[0].accounts, vec![0, 0]);
    }

    #[test]
    fn test_signed_transaction_verifies() {
        let payer = WalletKeypair::generate();
        let ix = system_transfer(&payer.pubkey(), &Pubkey([3; 32]), 42);
        let msg = Message::new(&[ix], &payer.pubkey(), Blockhash([5; 32]));
        let tx = Transaction::new_signed(msg.clone(), &payer);

        let wire = tx.serialize();
        assert_eq!(wire[0], 1);
        assert_eq!(&wire[65..], &msg.serialize()[..]);

        let verifying = VerifyingKey::from_bytes(payer.pubkey().as_bytes()).unwrap();
        let sig = ed25519_dalek::Signature::from_bytes(&tx.signature().unwrap().to_bytes());
        assert!(verifying.verify(&msg.serialize(), &sig).is_ok());

        assert_eq!(BASE64.decode(tx.to_base64()).unwrap(), wire);
    }
}
