//! Response and request bodies of the indexing API.

use std::str::FromStr;

use alloy::primitives::U256;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Paging information attached to transfer and swap listings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PageMeta {
    pub timestamp: i64,
    pub chains: Vec<String>,
    pub tokens: Vec<String>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
}

impl PageMeta {
    pub fn page_count(&self) -> u64 {
        if self.per_page == 0 {
            return 0;
        }
        self.total.div_ceil(self.per_page)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Transfer {
    pub timestamp: i64,
    pub from_address: String,
    pub from_owner: String,
    // The stream endpoint spells it with three s.
    #[serde(alias = "to_addresss")]
    pub to_address: String,
    pub to_owner: String,
    #[serde(deserialize_with = "amount")]
    pub amount: Option<U256>,
    pub token_address: String,
    pub symbol: String,
    pub chain: String,
    pub network: String,
    pub tx_hash: String,
    pub decimals: u8,
    pub position: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TransferPage {
    pub meta: PageMeta,
    pub transfers: Vec<Transfer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Swap {
    pub chain_name: String,
    pub tx_hash: String,
    pub timestamp: i64,
    pub token1_address: String,
    pub token1_symbol: String,
    pub token1_decimals: u8,
    pub token2_address: String,
    pub token2_symbol: String,
    pub token2_decimals: u8,
    pub token1_sender: String,
    pub token2_sender: String,
    #[serde(deserialize_with = "amount")]
    pub token1_amount: Option<U256>,
    #[serde(deserialize_with = "amount")]
    pub token2_amount: Option<U256>,
    #[serde(deserialize_with = "amount")]
    pub price_token1_in_token2: Option<U256>,
    #[serde(deserialize_with = "amount")]
    pub price_token2_in_token1: Option<U256>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SwapPage {
    pub meta: PageMeta,
    pub swaps: Vec<Swap>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EventMeta {
    pub chain: String,
    pub chain_id: u64,
    #[serde(alias = "addresss")]
    pub address: String,
    pub event: String,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EventPage {
    pub meta: EventMeta,
    pub events: Vec<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContractInfo {
    pub chain: String,
    pub network: String,
    pub contract_name: String,
    pub contract_address: String,
    /// Comma-separated event names.
    pub events: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainInfo {
    pub chain_name: String,
    pub chain_network: String,
    pub chain_id: u64,
}

/// Body of a contract registration.
#[derive(Debug, Clone, Serialize)]
pub struct NewContract {
    pub project_name: String,
    pub chain: String,
    pub network: String,
    pub contract_address: String,
    pub contract_name: String,
    pub event_names: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_abi: Option<String>,
}

/// Token amounts arrive as JSON numbers of any size or as strings.
fn amount<'de, D>(deserializer: D) -> Result<Option<U256>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match Value::deserialize(deserializer)? {
        Value::Null => return Ok(None),
        Value::Number(n) => n.to_string(),
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::String(s) => s,
        other => return Err(D::Error::custom(format!("invalid amount {other}"))),
    };

    U256::from_str(text.trim())
        .map(Some)
        .map_err(|e| D::Error::custom(format!("invalid amount {text}: {e}")))
}

#[cfg(test)]
mod tests {
    use alloy::primitives::U256;

    use super::{PageMeta, SwapPage, Transfer, TransferPage};

    #[test]
    fn keeps_large_amounts_exact() {
        let page: TransferPage = serde_json::from_str(
            r#"{
                "meta": { "page": 0, "per_page": 20, "total": 41 },
                "transfers": [
                    { "amount": 115792089237316195423570985008687907853269984665640564039457584007913129639935, "decimals": 18 },
                    { "amount": "1500000", "decimals": 6 },
                    { "decimals": 6 }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(page.transfers[0].amount, Some(U256::MAX));
        assert_eq!(page.transfers[1].amount, Some(U256::from(1_500_000)));
        assert_eq!(page.transfers[2].amount, None);
        assert_eq!(page.meta.page_count(), 3);
    }

    #[test]
    fn rejects_negative_amounts() {
        let result = serde_json::from_str::<Transfer>(r#"{ "amount": -1 }"#);
        assert!(result.is_err());
    }

    #[test]
    fn reads_streamed_recipient_spelling() {
        let transfer: Transfer =
            serde_json::from_str(r#"{ "to_addresss": "0xbeef", "to_owner": "0xcafe" }"#).unwrap();
        assert_eq!(transfer.to_address, "0xbeef");
        assert_eq!(transfer.to_owner, "0xcafe");
    }

    #[test]
    fn reads_string_prices() {
        let page: SwapPage = serde_json::from_str(
            r#"{ "swaps": [{ "token1_amount": 10, "price_token1_in_token2": "42" }] }"#,
        )
        .unwrap();
        let swap = &page.swaps[0];
        assert_eq!(swap.token1_amount, Some(U256::from(10)));
        assert_eq!(swap.price_token1_in_token2, Some(U256::from(42)));
        assert_eq!(swap.price_token2_in_token1, None);
    }

    #[test]
    fn page_count_without_page_size() {
        let meta = PageMeta {
            total: 10,
            ..Default::default()
        };
        assert_eq!(meta.page_count(), 0);
    }
}
