use alloy::{
    consensus::{SignableTransaction, TxEnvelope, TxLegacy},
    eips::eip2718::Encodable2718,
    primitives::{Bytes, TxKind, U256},
    signers::SignerSync,
};

use crate::{error::DeployError, wallet};

/// Inputs for a legacy contract-creation transaction.
#[derive(Debug, Clone)]
pub struct DeploymentTx<'a> {
    /// Init code, hex with or without `0x`.
    pub bytecode: &'a str,
    pub chain_id: u64,
    pub private_key: &'a str,
    pub gas_limit: u64,
    pub gas_price: u128,
    pub nonce: u64,
}

/// Signs a contract deployment and returns the raw transaction as hex,
/// without a `0x` prefix.
///
/// The transaction has no recipient and zero value. The chain id is committed
/// to in the signature as specified by EIP-155.
pub fn sign_deployment(params: &DeploymentTx<'_>) -> Result<String, DeployError> {
    let bytecode = params.bytecode.trim();
    let bytecode = hex::decode(bytecode.strip_prefix("0x").unwrap_or(bytecode))?;
    let signer = wallet::signer(params.private_key)?;

    let tx = TxLegacy {
        chain_id: Some(params.chain_id),
        nonce: params.nonce,
        gas_price: params.gas_price,
        gas_limit: params.gas_limit,
        to: TxKind::Create,
        value: U256::ZERO,
        input: Bytes::from(bytecode),
    };

    let signature = signer
        .sign_hash_sync(&tx.signature_hash())
        .map_err(|e| DeployError::Signing(e.to_string()))?;
    let envelope = TxEnvelope::from(tx.into_signed(signature));

    Ok(hex::encode(envelope.encoded_2718()))
}

#[cfg(test)]
mod tests {
    use alloy::{
        consensus::{Transaction, TxEnvelope},
        eips::eip2718::Decodable2718,
        primitives::{address, TxKind, U256},
    };

    use crate::error::DeployError;

    use super::{sign_deployment, DeploymentTx};

    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const BYTECODE: &str = "0x6080604052348015600f57600080fd5b50603f80601d6000396000f3fe";

    fn decode(raw: &str) -> TxEnvelope {
        let bytes = hex::decode(raw).unwrap();
        TxEnvelope::decode_2718(&mut bytes.as_slice()).unwrap()
    }

    #[test]
    fn signs_legacy_contract_creation() {
        let raw = sign_deployment(&DeploymentTx {
            bytecode: BYTECODE,
            chain_id: 31337,
            private_key: KEY,
            gas_limit: 1_000_000,
            gas_price: 1_000_000_000,
            nonce: 5,
        })
        .unwrap();
        assert!(!raw.starts_with("0x"));

        let envelope = decode(&raw);
        let signed = envelope.as_legacy().expect("legacy transaction");
        let tx = signed.tx();
        assert_eq!(tx.nonce, 5);
        assert_eq!(tx.gas_limit, 1_000_000);
        assert_eq!(tx.gas_price, 1_000_000_000);
        assert_eq!(tx.chain_id, Some(31337));
        assert_eq!(tx.to, TxKind::Create);
        assert_eq!(tx.value, U256::ZERO);
        assert_eq!(tx.input.as_ref(), hex::decode(&BYTECODE[2..]).unwrap().as_slice());
        assert_eq!(envelope.chain_id(), Some(31337));

        let sender = signed.recover_signer().unwrap();
        assert_eq!(sender, address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266"));
    }

    #[test]
    fn accepts_unprefixed_inputs() {
        let prefixed = sign_deployment(&DeploymentTx {
            bytecode: BYTECODE,
            chain_id: 1,
            private_key: KEY,
            gas_limit: 21_000,
            gas_price: 1,
            nonce: 0,
        })
        .unwrap();
        let bare = sign_deployment(&DeploymentTx {
            bytecode: &BYTECODE[2..],
            chain_id: 1,
            private_key: &KEY[2..],
            gas_limit: 21_000,
            gas_price: 1,
            nonce: 0,
        })
        .unwrap();

        // RFC 6979 signatures are deterministic.
        assert_eq!(prefixed, bare);
    }

    #[test]
    fn binds_signature_to_chain_id() {
        let sign = |chain_id| {
            sign_deployment(&DeploymentTx {
                bytecode: BYTECODE,
                chain_id,
                private_key: KEY,
                gas_limit: 1_000_000,
                gas_price: 1_000_000_000,
                nonce: 0,
            })
            .unwrap()
        };

        let mainnet = decode(&sign(1));
        let sepolia = decode(&sign(11155111));
        assert_eq!(mainnet.chain_id(), Some(1));
        assert_eq!(sepolia.chain_id(), Some(11155111));
        assert_ne!(mainnet.tx_hash(), sepolia.tx_hash());
    }

    #[test]
    fn rejects_invalid_bytecode() {
        let result = sign_deployment(&DeploymentTx {
            bytecode: "0xnothex",
            chain_id: 1,
            private_key: KEY,
            gas_limit: 1,
            gas_price: 1,
            nonce: 0,
        });
        assert!(matches!(result, Err(DeployError::Decode(_))));
    }

    #[test]
    fn rejects_invalid_key() {
        let result = sign_deployment(&DeploymentTx {
            bytecode: BYTECODE,
            chain_id: 1,
            private_key: "0x1234",
            gas_limit: 1,
            gas_price: 1,
            nonce: 0,
        });
        assert!(matches!(result, Err(DeployError::InvalidKey(_))));
    }
}
