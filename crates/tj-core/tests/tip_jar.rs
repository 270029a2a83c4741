use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tj_abi::{Address, ParamType, Token, U256, encode, encode_hex};
use tj_core::{DEFAULT_CONTRACT_ADDRESS, DisplayMode, TipError, TipJar, TipJarConfig, TipJarState};
use tj_rpc::mock::MockProvider;
use tj_rpc::{ProviderError, TokioSleeper};
use tj_types::{FormDraft, WalletAddress};

const NEW_MEMO_TOPIC: &str = "0xc56140e05f516509ae28110e0f72e17558a7561630dad2647c3ae87d986e365c";
const SENDER_TOPIC: &str = "0x000000000000000000000000134c96daaebf0e99fb2ed69bb48e73eacdc5ae61";
const TX: &str = "0x9b3f1a7e0c2d4b5a69788f7e6d5c4b3a291807f6e5d4c3b2a19080706050403";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("tj_core=debug")
        .with_test_writer()
        .try_init();
}

fn config() -> TipJarConfig {
    TipJarConfig {
        poll_interval_ms: 1,
        receipt_poll_interval_ms: 1,
        ..TipJarConfig::default()
    }
}

fn tip_jar(mock: &Arc<MockProvider>) -> TipJar<MockProvider> {
    TipJar::new(Some(mock.clone()), config(), Arc::new(TokioSleeper)).unwrap()
}

fn memo_shape() -> ParamType {
    ParamType::Tuple(vec![
        ParamType::Address,
        ParamType::Uint(256),
        ParamType::String,
        ParamType::String,
    ])
}

fn history(names: &[&str]) -> Value {
    let from: Address = DEFAULT_CONTRACT_ADDRESS.parse().unwrap();
    let memos = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            Token::Tuple(vec![
                Token::Address(from),
                Token::Uint(U256::from(1_650_000_000u64 + i as u64)),
                Token::String((*name).into()),
                Token::String("hi".into()),
            ])
        })
        .collect();
    let output = encode(&[ParamType::Array(Box::new(memo_shape()))], &[Token::Array(memos)]).unwrap();
    json!(encode_hex(&output))
}

fn new_memo_log(name: &str, message: &str) -> Value {
    let data = encode(
        &[ParamType::Uint(256), ParamType::String, ParamType::String],
        &[
            Token::Uint(U256::from(1_650_000_000u64)),
            Token::String(name.into()),
            Token::String(message.into()),
        ],
    )
    .unwrap();
    json!({
        "address": DEFAULT_CONTRACT_ADDRESS,
        "topics": [NEW_MEMO_TOPIC, SENDER_TOPIC],
        "data": encode_hex(&data),
    })
}

fn recorder() -> (Arc<Mutex<Vec<TipJarState>>>, tj_core::ChangeListener) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    (seen, Box::new(move |state: &TipJarState| sink.lock().unwrap().push(state.clone())))
}

fn names(state: &TipJarState) -> Vec<String> {
    state.memos().map(|memo| memo.name.clone()).collect()
}

#[tokio::test]
async fn no_wallet_keeps_the_connect_prompt() {
    init_tracing();
    let jar = TipJar::<MockProvider>::new(None, config(), Arc::new(TokioSleeper)).unwrap();

    assert!(matches!(jar.connect().await, Err(TipError::WalletUnavailable)));
    assert_eq!(jar.state().account, None);
    assert_eq!(jar.state().mode(), DisplayMode::Disconnected);

    let (_seen, listener) = recorder();
    let (report, driver) = jar.mount(listener).await;
    assert!(matches!(report.account, Err(TipError::WalletUnavailable)));
    assert!(matches!(report.history, Err(TipError::WalletUnavailable)));
    assert!(matches!(report.feed, Err(TipError::WalletUnavailable)));
    assert!(driver.is_none());
    assert_eq!(jar.state().mode(), DisplayMode::Disconnected);
}

#[tokio::test]
async fn authorized_wallet_connects_silently_on_mount() -> anyhow::Result<()> {
    init_tracing();
    let mock = Arc::new(MockProvider::new());
    mock.reply("eth_accounts", json!(["0xABC"]))
        .reply("eth_call", history(&["Ann", "Bob"]))
        .reply("eth_newFilter", json!("0x1"));
    let jar = tip_jar(&mock);

    let (_seen, listener) = recorder();
    let (report, driver) = jar.mount(listener).await;

    assert_eq!(report.account?, Some(WalletAddress::from("0xABC")));
    assert_eq!(report.history?, 2);
    report.feed?;
    assert!(driver.is_some());

    let state = jar.state();
    assert_eq!(state.account, Some(WalletAddress::from("0xABC")));
    assert_eq!(state.mode(), DisplayMode::Connected);
    assert_eq!(names(&state), ["Ann", "Bob"]);
    assert!(mock.calls_to("eth_requestAccounts").is_empty());
    Ok(())
}

#[tokio::test]
async fn mount_listens_before_reading_history() -> anyhow::Result<()> {
    let mock = Arc::new(MockProvider::new());
    mock.reply("eth_accounts", json!(["0xABC"]))
        .reply("eth_call", history(&["Ann"]))
        .reply("eth_newFilter", json!("0x1"));
    let jar = tip_jar(&mock);

    let (_seen, listener) = recorder();
    let (report, _driver) = jar.mount(listener).await;
    report.feed?;

    let order: Vec<String> = mock.calls().into_iter().map(|(method, _)| method).collect();
    assert_eq!(order, ["eth_accounts", "eth_newFilter", "eth_call"]);

    let call = &mock.calls_to("eth_call")[0];
    assert_eq!(call[0]["to"], jar.config().contract_address.0.as_str());
    assert_eq!(call[1], "latest");
    Ok(())
}

#[tokio::test]
async fn explicit_connect_sets_the_account()-> anyhow::Result<()> {
    let mock = Arc::new(MockProvider::new());
    mock.reply("eth_requestAccounts", json!(["0xABC"]))
        .fail("eth_requestAccounts", ProviderError::Rpc { code: 4001, message: "rejected".into() });
    let jar = tip_jar(&mock);

    assert_eq!(jar.connect().await?, WalletAddress::from("0xABC"));
    assert_eq!(jar.state().mode(), DisplayMode::Connected);

    // a later decline leaves the account alone
    assert!(matches!(jar.connect().await, Err(TipError::UserRejected)));
    assert_eq!(jar.state().account, Some(WalletAddress::from("0xABC")));
    Ok(())
}

#[tokio::test]
async fn successful_submit_clears_the_draft_only() -> anyhow::Result<()> {
    init_tracing();
    let mock = Arc::new(MockProvider::new());
    mock.reply("eth_requestAccounts", json!(["0xABC"]))
        .reply("eth_sendTransaction", json!(TX))
        .reply("eth_getTransactionReceipt", json!(null))
        .reply(
            "eth_getTransactionReceipt",
            json!({ "transactionHash": TX, "blockNumber": "0x5", "status": "0x1" }),
        );
    let jar = tip_jar(&mock);
    jar.connect().await?;
    jar.on_name_changed("Guy");
    jar.on_message_changed("Enjoy!");
    let before = jar.state();

    let receipt = jar.submit().await?;
    assert_eq!(receipt.tx_hash.0, TX);
    assert_eq!(receipt.block_number, Some(5));

    let after = jar.state();
    assert_eq!(after.draft, FormDraft::default());
    // the memo only arrives through the live feed
    assert_eq!(after.memo_count(), before.memo_count());

    let tx = &mock.calls_to("eth_sendTransaction")[0][0];
    assert_eq!(tx["from"], "0xABC");
    assert_eq!(tx["value"], "0x2386f26fc10000");
    Ok(())
}

#[tokio::test]
async fn failed_submits_leave_the_draft_unchanged() {
    let mock = Arc::new(MockProvider::new());
    mock.reply("eth_requestAccounts", json!(["0xABC"]))
        .fail("eth_sendTransaction", ProviderError::Rpc { code: 4001, message: "denied".into() })
        .fail("eth_sendTransaction", ProviderError::Transport("offline".into()))
        .reply("eth_sendTransaction", json!(TX))
        .reply("eth_getTransactionReceipt", json!({ "transactionHash": TX, "status": "0x0" }));
    let jar = tip_jar(&mock);
    jar.connect().await.unwrap();
    jar.on_name_changed("Guy");
    jar.on_message_changed("Enjoy!");
    let draft = jar.state().draft;

    assert!(matches!(jar.submit().await, Err(TipError::UserRejected)));
    assert_eq!(jar.state().draft, draft);
    assert!(matches!(jar.submit().await, Err(TipError::Remote(_))));
    assert_eq!(jar.state().draft, draft);
    assert!(matches!(jar.submit().await, Err(TipError::Reverted(_))));
    assert_eq!(jar.state().draft, draft);
}

#[tokio::test]
async fn submit_without_any_account_is_not_connected() {
    let mock = Arc::new(MockProvider::new());
    mock.reply("eth_accounts", json!([]));
    let jar = tip_jar(&mock);
    jar.on_name_changed("Guy");

    assert!(matches!(jar.submit().await, Err(TipError::NotConnected)));
    assert_eq!(jar.state().draft.name, "Guy");
    assert!(mock.calls_to("eth_sendTransaction").is_empty());
}

#[tokio::test]
async fn submit_falls_back_to_the_authorized_account() -> anyhow::Result<()> {
    let mock = Arc::new(MockProvider::new());
    mock.reply("eth_accounts", json!(["0xDEF"]))
        .reply("eth_sendTransaction", json!(TX))
        .reply("eth_getTransactionReceipt", json!({ "transactionHash": TX, "status": "0x1" }));
    let jar = tip_jar(&mock);

    jar.submit().await?;
    assert_eq!(mock.calls_to("eth_sendTransaction")[0][0]["from"], "0xDEF");
    Ok(())
}

#[tokio::test]
async fn live_memos_append_one_each_in_arrival_order() -> anyhow::Result<()> {
    init_tracing();
    let mock = Arc::new(MockProvider::new());
    mock.reply("eth_accounts", json!(["0xABC"]))
        .reply("eth_call", history(&["Ann"]))
        .reply("eth_newFilter", json!("0x1"))
        .reply("eth_getFilterChanges", json!([new_memo_log("Guy", "Enjoy!")]))
        .reply("eth_getFilterChanges", json!([]))
        .reply(
            "eth_getFilterChanges",
            json!([new_memo_log("Zoe", "gm"), new_memo_log("Max", "ty")]),
        );
    let jar = tip_jar(&mock);

    let (seen, listener) = recorder();
    let (_report, driver) = jar.mount(listener).await;
    let mut driver = driver.expect("feed is open");

    assert_eq!(driver.poll_once().await?, 1);
    assert_eq!(driver.poll_once().await?, 0);
    assert_eq!(driver.poll_once().await?, 2);

    let state = jar.state();
    assert_eq!(names(&state), ["Ann", "Guy", "Zoe", "Max"]);

    let counts: Vec<usize> = seen.lock().unwrap().iter().map(TipJarState::memo_count).collect();
    assert_eq!(counts, [2, 3, 4]);
    Ok(())
}

#[tokio::test]
async fn history_arriving_after_live_memos_keeps_them() -> anyhow::Result<()> {
    let mock = Arc::new(MockProvider::new());
    mock.reply("eth_accounts", json!(["0xABC"]))
        .reply("eth_call", history(&["Ann"]))
        .reply("eth_newFilter", json!("0x1"))
        .reply("eth_getFilterChanges", json!([new_memo_log("Guy", "Enjoy!")]))
        .reply("eth_call", history(&["Ann", "Guy"]))
        .reply("eth_newFilter", json!("0x2"));
    let jar = tip_jar(&mock);

    let (_seen, listener) = recorder();
    let (_report, driver) = jar.mount(listener).await;
    driver.expect("feed is open").poll_once().await?;

    // a second mount reloads history while the live tail is kept
    let (_seen, listener) = recorder();
    let (report, _driver) = jar.mount(listener).await;
    assert_eq!(report.history?, 2);
    assert_eq!(names(&jar.state()), ["Ann", "Guy", "Guy"]);
    Ok(())
}

#[tokio::test]
async fn unmount_stops_delivery_and_is_idempotent() -> anyhow::Result<()> {
    let mock = Arc::new(MockProvider::new());
    mock.reply("eth_accounts", json!(["0xABC"]))
        .reply("eth_call", history(&[]))
        .reply("eth_newFilter", json!("0x1"))
        .always("eth_getFilterChanges", Ok(json!([new_memo_log("Late", "too late")])))
        .always("eth_uninstallFilter", Ok(json!(true)));
    let jar = tip_jar(&mock);

    let (seen, listener) = recorder();
    let (_report, driver) = jar.mount(listener).await;
    let mut driver = driver.expect("feed is open");

    assert!(jar.unmount());
    assert!(!jar.unmount());
    assert!(!jar.unmount());

    assert_eq!(driver.poll_once().await?, 0);
    assert_eq!(jar.state().memo_count(), 0);
    assert!(seen.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn spawned_driver_feeds_the_store_until_unmount() -> anyhow::Result<()> {
    let mock = Arc::new(MockProvider::new());
    mock.reply("eth_accounts", json!(["0xABC"]))
        .reply("eth_call", history(&[]))
        .reply("eth_newFilter", json!("0x9"))
        .reply("eth_getFilterChanges", json!([new_memo_log("Guy", "Enjoy!")]))
        .always("eth_getFilterChanges", Ok(json!([])))
        .always("eth_uninstallFilter", Ok(json!(true)));
    let jar = tip_jar(&mock);

    let (seen, listener) = recorder();
    let (_report, driver) = jar.mount(listener).await;
    let task = tokio::spawn(driver.expect("feed is open").run());

    while seen.lock().unwrap().is_empty() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    assert!(jar.unmount());
    task.await?;

    assert_eq!(names(&jar.state()), ["Guy"]);
    assert_eq!(mock.calls_to("eth_uninstallFilter"), vec![json!(["0x9"])]);
    Ok(())
}

#[tokio::test]
async fn bad_config_is_rejected_up_front() {
    let config = TipJarConfig {
        poll_interval_ms: 0,
        ..TipJarConfig::default()
    };
    let jar = TipJar::<MockProvider>::new(None, config, Arc::new(TokioSleeper));
    assert!(matches!(jar, Err(TipError::Config(_))));
}
