//! In-memory native core.
//!
//! A reference implementation of `NativeCore` with wallets, accounts,
//! clients and secret managers held in process memory. It honours the full
//! boundary contract (envelopes in and out, panics caught, push delivery
//! through sinks) and backs the test suite.
//!
//! Besides the method catalogues in `ferry_types::methods`, every object
//! understands `triggerPanic` (`{ "message"?: string }`), which panics
//! inside the core.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use ferry_bus::EventFilter;
use ferry_types::numeric::{parse_u64, u256_to_hex};
use ferry_types::{
    AccountBalance, AccountId, AccountInfo, AccountMethod, ClientMethod, DomainErrorKind,
    EventType, HandleKind, InstanceId, MethodEnvelope, NativeCore, PushSink, SecretManagerMethod,
    UtilsMethod, WalletMethod,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use rand::seq::SliceRandom;
use tracing::debug;

use super::responder::{catch_panics, respond, NativeError};

/// Method name that makes the core panic.
pub const TRIGGER_PANIC: &str = "triggerPanic";

const DEFAULT_NODE: &str = "http://localhost:14265";
const DEFAULT_NETWORK: &str = "testnet";
const MNEMONIC_WORDS: usize = 24;
/// Most addresses one `generateEd25519Addresses` call may produce.
const MAX_ADDRESSES_PER_CALL: u32 = 1000;

const WORDS: [&str; 32] = [
    "anchor", "basket", "cable", "delta", "ember", "fabric", "garden", "harbor", "island",
    "jacket", "kernel", "ladder", "marble", "nectar", "orbit", "pepper", "quarry", "ribbon",
    "saddle", "timber", "umbrella", "velvet", "walnut", "yonder", "zephyr", "beacon", "canyon",
    "dynamo", "falcon", "glacier", "meadow", "summit",
];

type Push = (PushSink, Result<String, String>);

struct Listener {
    /// Instance the listener was registered through.
    owner: InstanceId,
    filter: EventFilter,
    sink: PushSink,
}

struct AccountState {
    info: AccountInfo,
    addresses: Vec<String>,
    balance: AccountBalance,
}

#[derive(Default)]
struct ClientState {
    node: String,
    network: String,
    listeners: Vec<Listener>,
}

#[derive(Default)]
struct SecretManagerState {
    mnemonic: Option<String>,
}

struct WalletState {
    accounts: Vec<AccountState>,
    listeners: Vec<Listener>,
    client: ClientState,
    secret_manager: SecretManagerState,
    password: Option<String>,
    initial_base_coin: u64,
}

enum NativeObject {
    Wallet(WalletState),
    Client(ClientState),
    SecretManager(SecretManagerState),
    Derived { parent: InstanceId, kind: HandleKind },
}

enum Target<'a> {
    Wallet(&'a mut WalletState),
    Client(&'a mut ClientState),
    SecretManager(&'a mut SecretManagerState),
}

#[derive(Default)]
struct CoreState {
    objects: HashMap<InstanceId, NativeObject>,
}

/// Process-local native core.
#[derive(Default)]
pub struct InMemoryCore {
    state: Mutex<CoreState>,
    next_instance: AtomicU64,
}

impl InMemoryCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes an MQTT message to every client listener whose topic filter
    /// matches. The payload is serialized to JSON text inside the push.
    pub fn publish(&self, topic: &str, payload: &Value) {
        let event_type = EventType::Topic(topic.to_string());
        let text = json!({ "topic": topic, "payload": payload.to_string() }).to_string();
        let pushes: Vec<Push> = {
            let state = self.state.lock();
            state
                .objects
                .values()
                .filter_map(|object| match object {
                    NativeObject::Client(client) => Some(&client.listeners),
                    NativeObject::Wallet(wallet) => Some(&wallet.client.listeners),
                    _ => None,
                })
                .flatten()
                .filter(|listener| listener.filter.matches(&event_type))
                .map(|listener| (listener.sink.clone(), Ok(text.clone())))
                .collect()
        };
        deliver(pushes);
    }

    /// Sends `push` verbatim to every listener on `instance`, ignoring
    /// filters. Used to simulate malformed pushes and delivery errors.
    pub fn push_raw(&self, instance: InstanceId, push: Result<String, String>) {
        let pushes: Vec<Push> = {
            let mut state = self.state.lock();
            match state.target(instance).ok().and_then(Target::into_listeners) {
                Some(listeners) => listeners
                    .iter()
                    .map(|listener| (listener.sink.clone(), push.clone()))
                    .collect(),
                None => Vec::new(),
            }
        };
        deliver(pushes);
    }

    /// Native listeners currently registered on `instance`.
    pub fn listener_count(&self, instance: InstanceId) -> usize {
        let mut state = self.state.lock();
        state
            .target(instance)
            .ok()
            .and_then(Target::into_listeners)
            .map_or(0, |listeners| listeners.len())
    }

    /// Live native objects, derived references included.
    pub fn object_count(&self) -> usize {
        self.state.lock().objects.len()
    }

    fn allocate(&self) -> InstanceId {
        InstanceId(self.next_instance.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn handle_call(&self, instance: InstanceId, method: &str) -> ferry_types::ResponseEnvelope {
        let envelope: MethodEnvelope = match serde_json::from_str(method) {
            Ok(envelope) => envelope,
            Err(e) => return respond::<Value>(Err(e.into())),
        };
        if envelope.name() == TRIGGER_PANIC {
            trigger_panic(&envelope);
        }

        let mut pushes = Vec::new();
        let response = {
            let mut state = self.state.lock();
            match state.target(instance) {
                Err(e) => respond::<Value>(Err(e)),
                Ok(Target::Wallet(wallet)) => respond(wallet.call(envelope, &mut pushes)),
                Ok(Target::Client(client)) => respond(client.call(envelope)),
                Ok(Target::SecretManager(secrets)) => respond(secrets.call(envelope)),
            }
        };
        deliver(pushes);
        response
    }
}

#[async_trait]
impl NativeCore for InMemoryCore {
    async fn create(&self, kind: HandleKind, options: String) -> Result<InstanceId, String> {
        let options: Value = serde_json::from_str(&options).map_err(|e| e.to_string())?;
        if !options.is_object() {
            return Err("options must be a JSON object".to_string());
        }
        let object = match kind {
            HandleKind::Wallet => NativeObject::Wallet(WalletState::from_options(&options)?),
            HandleKind::Client => NativeObject::Client(ClientState::from_options(&options)?),
            HandleKind::SecretManager => {
                NativeObject::SecretManager(SecretManagerState::from_options(&options)?)
            }
        };
        let instance = self.allocate();
        self.state.lock().objects.insert(instance, object);
        debug!(%instance, %kind, "Native object created");
        Ok(instance)
    }

    async fn derive(&self, parent: InstanceId, kind: HandleKind) -> Result<InstanceId, String> {
        if kind == HandleKind::Wallet {
            return Err("a wallet cannot be derived".to_string());
        }
        let mut state = self.state.lock();
        match state.objects.get(&parent) {
            Some(NativeObject::Wallet(_)) => {}
            Some(_) => return Err(format!("{parent} is not a wallet")),
            None => return Err(format!("unknown instance {parent}")),
        }
        let instance = self.allocate();
        state
            .objects
            .insert(instance, NativeObject::Derived { parent, kind });
        Ok(instance)
    }

    async fn call(&self, instance: InstanceId, method: String) -> String {
        catch_panics(async { self.handle_call(instance, &method) })
            .await
            .encode()
    }

    async fn call_utils(&self, method: String) -> String {
        catch_panics(async { utils_call(&method) }).await.encode()
    }

    async fn listen(
        &self,
        instance: InstanceId,
        event_types: Vec<EventType>,
        sink: PushSink,
    ) -> Result<(), String> {
        let mut state = self.state.lock();
        let target = state.target(instance).map_err(|e| e.message)?;
        let listeners = match target {
            Target::Wallet(wallet) => {
                if let Some(topic) = event_types.iter().find(|t| t.is_topic()) {
                    return Err(format!("{topic} is not a wallet event type"));
                }
                &mut wallet.listeners
            }
            Target::Client(client) => {
                if event_types.is_empty() {
                    return Err("no MQTT topics given".to_string());
                }
                if let Some(kind) = event_types.iter().find(|t| !t.is_topic()) {
                    return Err(format!("{kind} is not an MQTT topic"));
                }
                &mut client.listeners
            }
            Target::SecretManager(_) => {
                return Err("secret managers emit no events".to_string());
            }
        };
        listeners.push(Listener {
            owner: instance,
            filter: EventFilter::of(event_types),
            sink,
        });
        Ok(())
    }

    async fn clear_listeners(
        &self,
        instance: InstanceId,
        event_types: Vec<EventType>,
    ) -> Result<(), String> {
        let mut state = self.state.lock();
        let target = state.target(instance).map_err(|e| e.message)?;
        if let Some(listeners) = target.into_listeners() {
            listeners.retain_mut(|listener| match listener.filter.without(&event_types) {
                Some(remaining) => {
                    listener.filter = remaining;
                    true
                }
                None => false,
            });
        }
        Ok(())
    }

    async fn destroy(&self, instance: InstanceId) -> Result<(), String> {
        let mut state = self.state.lock();
        match state.objects.remove(&instance) {
            Some(NativeObject::Wallet(_)) => {
                state.objects.retain(|_, object| {
                    !matches!(object, NativeObject::Derived { parent, .. } if *parent == instance)
                });
            }
            Some(NativeObject::Derived { parent, .. }) => {
                if let Some(NativeObject::Wallet(wallet)) = state.objects.get_mut(&parent) {
                    wallet.client.listeners.retain(|listener| listener.owner != instance);
                }
            }
            Some(_) => {}
            None => return Err(format!("unknown instance {instance}")),
        }
        debug!(%instance, "Native object destroyed");
        Ok(())
    }
}

impl CoreState {
    fn target(&mut self, instance: InstanceId) -> Result<Target<'_>, NativeError> {
        let (root, derived) = match self.objects.get(&instance) {
            Some(NativeObject::Derived { parent, kind }) => (*parent, Some(*kind)),
            Some(_) => (instance, None),
            None => {
                return Err(NativeError::new(
                    DomainErrorKind::Unknown,
                    format!("unknown instance {instance}"),
                ))
            }
        };
        match (self.objects.get_mut(&root), derived) {
            (Some(NativeObject::Wallet(wallet)), None) => Ok(Target::Wallet(wallet)),
            (Some(NativeObject::Wallet(wallet)), Some(HandleKind::Client)) => {
                Ok(Target::Client(&mut wallet.client))
            }
            (Some(NativeObject::Wallet(wallet)), Some(HandleKind::SecretManager)) => {
                Ok(Target::SecretManager(&mut wallet.secret_manager))
            }
            (Some(NativeObject::Client(client)), None) => Ok(Target::Client(client)),
            (Some(NativeObject::SecretManager(secrets)), None) => {
                Ok(Target::SecretManager(secrets))
            }
            _ => Err(NativeError::new(
                DomainErrorKind::Unknown,
                format!("instance {instance} no longer resolves"),
            )),
        }
    }
}

impl<'a> Target<'a> {
    fn into_listeners(self) -> Option<&'a mut Vec<Listener>> {
        match self {
            Self::Wallet(wallet) => Some(&mut wallet.listeners),
            Self::Client(client) => Some(&mut client.listeners),
            Self::SecretManager(_) => None,
        }
    }
}

impl WalletState {
    fn from_options(options: &Value) -> Result<Self, String> {
        let client = match options.get("clientOptions") {
            Some(client_options) => ClientState::from_options(client_options)?,
            None => ClientState::from_options(&json!({}))?,
        };
        let secret_manager = match options.get("secretManager") {
            Some(secret_options) => SecretManagerState::from_options(secret_options)?,
            None => SecretManagerState::default(),
        };
        let initial_base_coin = match options.get("initialBaseCoin") {
            None => 0,
            Some(Value::String(text)) => parse_u64(text).map_err(|e| e.to_string())?,
            Some(Value::Number(number)) => number
                .as_u64()
                .ok_or_else(|| "initialBaseCoin must be unsigned".to_string())?,
            Some(_) => return Err("initialBaseCoin must be a string or number".to_string()),
        };
        Ok(Self {
            accounts: Vec::new(),
            listeners: Vec::new(),
            client,
            secret_manager,
            password: None,
            initial_base_coin,
        })
    }

    fn call(
        &mut self,
        envelope: MethodEnvelope,
        pushes: &mut Vec<Push>,
    ) -> Result<Value, NativeError> {
        let method: WalletMethod = serde_json::from_value(envelope.into_value())?;
        match method {
            WalletMethod::CreateAccount { alias } => {
                let index = u32::try_from(self.accounts.len())
                    .map_err(|_| wallet_error("account limit reached"))?;
                let alias = alias.unwrap_or_else(|| format!("Account {index}"));
                if self.accounts.iter().any(|account| account.info.alias == alias) {
                    return Err(wallet_error(format!("account alias {alias} already exists")));
                }
                let mut balance = AccountBalance::default();
                balance.base_coin.total = self.initial_base_coin;
                balance.base_coin.available = self.initial_base_coin;
                let info = AccountInfo { index, alias };
                self.accounts.push(AccountState {
                    info: info.clone(),
                    addresses: Vec::new(),
                    balance,
                });
                Ok(serde_json::to_value(info)?)
            }
            WalletMethod::GetAccount { account_id } => {
                Ok(serde_json::to_value(&self.account_mut(&account_id)?.info)?)
            }
            WalletMethod::GetAccounts => {
                let infos: Vec<&AccountInfo> = self.accounts.iter().map(|a| &a.info).collect();
                Ok(serde_json::to_value(infos)?)
            }
            WalletMethod::GetAccountIndexes => {
                let indexes: Vec<u32> = self.accounts.iter().map(|a| a.info.index).collect();
                Ok(serde_json::to_value(indexes)?)
            }
            WalletMethod::CallAccountMethod { account_id, method } => {
                let account = self.account_mut(&account_id)?;
                let index = account.info.index;
                let (result, event) = account.call(method)?;
                if let Some(event) = event {
                    self.queue_event(index, event, pushes);
                }
                Ok(result)
            }
            WalletMethod::SetStrongholdPassword { password } => {
                self.password = Some(password);
                Ok(Value::Null)
            }
            WalletMethod::EmitTestEvent { event } => {
                self.queue_event(0, event, pushes);
                Ok(Value::Null)
            }
        }
    }

    fn account_mut(&mut self, id: &AccountId) -> Result<&mut AccountState, NativeError> {
        self.accounts
            .iter_mut()
            .find(|account| match id {
                AccountId::Index(index) => account.info.index == *index,
                AccountId::Alias(alias) => &account.info.alias == alias,
            })
            .ok_or_else(|| wallet_error(format!("account {id} not found")))
    }

    /// Queues a wallet event for every listener whose filter accepts it.
    /// Events without a recognisable type only reach all-type listeners.
    fn queue_event(&self, account_index: u32, event: Value, pushes: &mut Vec<Push>) {
        let event_type = match event.get("type") {
            Some(Value::String(name)) => Some(EventType::from(name.as_str())),
            Some(Value::Number(code)) => code.as_u64().and_then(EventType::from_code),
            _ => None,
        };
        let text = json!({ "accountIndex": account_index, "event": event }).to_string();
        for listener in &self.listeners {
            let accepted = match &event_type {
                Some(event_type) => listener.filter.matches(event_type),
                None => listener.filter.is_all(),
            };
            if accepted {
                pushes.push((listener.sink.clone(), Ok(text.clone())));
            }
        }
    }
}

impl AccountState {
    /// Runs one account method; may yield a wallet event body to emit.
    fn call(&mut self, method: AccountMethod) -> Result<(Value, Option<Value>), NativeError> {
        match method {
            AccountMethod::GetBalance | AccountMethod::SyncAccount => {
                Ok((serde_json::to_value(&self.balance)?, None))
            }
            AccountMethod::Addresses => Ok((serde_json::to_value(&self.addresses)?, None)),
            AccountMethod::GenerateEd25519Addresses { amount } => {
                check_address_amount(amount).map_err(wallet_error)?;
                let start = self.addresses.len();
                let generated: Vec<String> = (start..start + amount as usize)
                    .map(|position| address_for(self.info.index, position))
                    .collect();
                self.addresses.extend(generated.iter().cloned());
                Ok((serde_json::to_value(generated)?, None))
            }
            AccountMethod::SetAlias { alias } => {
                self.info.alias = alias;
                Ok((Value::Null, None))
            }
            AccountMethod::MintNativeToken { token_id, amount } => {
                let held = self.balance.native_tokens.entry(token_id.clone()).or_default();
                *held = held
                    .checked_add(amount)
                    .ok_or_else(|| wallet_error("native token amount overflow"))?;
                let event = json!({
                    "type": EventType::NewOutput.as_str(),
                    "output": { "tokenId": token_id, "amount": u256_to_hex(&amount) },
                });
                Ok((serde_json::to_value(&self.balance)?, Some(event)))
            }
        }
    }
}

impl ClientState {
    fn from_options(options: &Value) -> Result<Self, String> {
        let node = match options.get("nodes") {
            None => DEFAULT_NODE.to_string(),
            Some(Value::Array(nodes)) => nodes
                .first()
                .and_then(Value::as_str)
                .ok_or_else(|| "nodes must be a non-empty list of urls".to_string())?
                .to_string(),
            Some(_) => return Err("nodes must be a list of urls".to_string()),
        };
        let network = options
            .get("networkName")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_NETWORK)
            .to_string();
        Ok(Self {
            node,
            network,
            listeners: Vec::new(),
        })
    }

    fn call(&mut self, envelope: MethodEnvelope) -> Result<Value, NativeError> {
        let method: ClientMethod = serde_json::from_value(envelope.into_value())?;
        match method {
            ClientMethod::GetInfo => Ok(json!({ "url": self.node, "networkName": self.network })),
            ClientMethod::GetNetworkId => Ok(Value::String(self.network.clone())),
        }
    }
}

impl SecretManagerState {
    fn from_options(options: &Value) -> Result<Self, String> {
        match options.get("mnemonic") {
            None => Ok(Self::default()),
            Some(Value::String(mnemonic)) => {
                validate_mnemonic(mnemonic).map_err(|e| e.message)?;
                Ok(Self {
                    mnemonic: Some(mnemonic.clone()),
                })
            }
            Some(_) => Err("mnemonic must be a string".to_string()),
        }
    }

    fn call(&mut self, envelope: MethodEnvelope) -> Result<Value, NativeError> {
        let method: SecretManagerMethod = serde_json::from_value(envelope.into_value())?;
        match method {
            SecretManagerMethod::GenerateEd25519Addresses {
                account_index,
                amount,
            } => {
                if self.mnemonic.is_none() {
                    return Err(NativeError::new(
                        DomainErrorKind::SecretManager,
                        "no mnemonic stored",
                    ));
                }
                check_address_amount(amount)
                    .map_err(|message| NativeError::new(DomainErrorKind::SecretManager, message))?;
                let addresses: Vec<String> = (0..amount as usize)
                    .map(|position| address_for(account_index, position))
                    .collect();
                Ok(serde_json::to_value(addresses)?)
            }
            SecretManagerMethod::StoreMnemonic { mnemonic } => {
                validate_mnemonic(&mnemonic)
                    .map_err(|e| NativeError::new(DomainErrorKind::SecretManager, e.message))?;
                if self.mnemonic.is_some() {
                    return Err(NativeError::new(
                        DomainErrorKind::SecretManager,
                        "mnemonic already stored",
                    ));
                }
                self.mnemonic = Some(mnemonic);
                Ok(Value::Null)
            }
        }
    }
}

fn utils_call(method: &str) -> ferry_types::ResponseEnvelope {
    let envelope: MethodEnvelope = match serde_json::from_str(method) {
        Ok(envelope) => envelope,
        Err(e) => return respond::<Value>(Err(e.into())),
    };
    if envelope.name() == TRIGGER_PANIC {
        trigger_panic(&envelope);
    }
    let result = serde_json::from_value::<UtilsMethod>(envelope.into_value())
        .map_err(NativeError::from)
        .and_then(|method| match method {
            UtilsMethod::GenerateMnemonic => Ok(Value::String(generate_mnemonic())),
            UtilsMethod::VerifyMnemonic { mnemonic } => {
                validate_mnemonic(&mnemonic).map(|()| Value::Null)
            }
        });
    respond(result)
}

fn trigger_panic(envelope: &MethodEnvelope) -> ! {
    let message = envelope
        .data()
        .and_then(|data| data.get("message"))
        .and_then(Value::as_str)
        .unwrap_or("native fault")
        .to_string();
    panic!("{message}");
}

fn deliver(pushes: Vec<Push>) {
    for (sink, push) in pushes {
        sink(push);
    }
}

fn wallet_error(message: impl Into<String>) -> NativeError {
    NativeError::new(DomainErrorKind::Wallet, message)
}

fn address_for(account_index: u32, position: usize) -> String {
    format!("rms1q{account_index:04x}{position:08x}")
}

fn check_address_amount(amount: u32) -> Result<(), String> {
    if amount > MAX_ADDRESSES_PER_CALL {
        return Err(format!(
            "cannot generate {amount} addresses at once (limit {MAX_ADDRESSES_PER_CALL})"
        ));
    }
    Ok(())
}

fn generate_mnemonic() -> String {
    let mut rng = rand::thread_rng();
    (0..MNEMONIC_WORDS)
        .filter_map(|_| WORDS.choose(&mut rng).copied())
        .collect::<Vec<_>>()
        .join(" ")
}

fn validate_mnemonic(mnemonic: &str) -> Result<(), NativeError> {
    let words: Vec<&str> = mnemonic.split_whitespace().collect();
    if words.len() != MNEMONIC_WORDS || words.iter().any(|word| !WORDS.contains(word)) {
        return Err(NativeError::new(DomainErrorKind::Utils, "invalid mnemonic"));
    }
    Ok(())
}
