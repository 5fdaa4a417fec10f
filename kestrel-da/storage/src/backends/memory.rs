// std
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
// crates
use bytes::Bytes;
use rand::Rng as _;
// internal
use crate::{Protocol, StorageBackend, StorageError};
use kestrel_core::da::hash;

#[derive(Clone, Copy, Debug)]
enum Latency {
    None,
    Fixed(Duration),
    UpTo(Duration),
}

/// Process local backend used in tests and local runs.
pub struct MemoryBackend {
    protocol: Protocol,
    objects: Mutex<HashMap<String, Bytes>>,
    latency: Latency,
    fail_stores: AtomicBool,
    stores: AtomicUsize,
    retrieves: AtomicUsize,
}

impl MemoryBackend {
    #[must_use]
    pub fn new(protocol: Protocol) -> Self {
        Self {
            protocol,
            objects: Mutex::new(HashMap::new()),
            latency: Latency::None,
            fail_stores: AtomicBool::new(false),
            stores: AtomicUsize::new(0),
            retrieves: AtomicUsize::new(0),
        }
    }

    /// Every call sleeps a random duration in `[0, max]`.
    #[must_use]
    pub fn with_max_latency(mut self, max: Duration) -> Self {
        self.latency = Latency::UpTo(max);
        self
    }

    #[must_use]
    pub fn with_fixed_latency(mut self, latency: Duration) -> Self {
        self.latency = Latency::Fixed(latency);
        self
    }

    pub fn fail_stores(&self, fail: bool) {
        self.fail_stores.store(fail, Ordering::SeqCst);
    }

    pub fn store_calls(&self) -> usize {
        self.stores.load(Ordering::SeqCst)
    }

    pub fn retrieve_calls(&self) -> usize {
        self.retrieves.load(Ordering::SeqCst)
    }

    /// Flips the first byte of the object at `uri`.
    pub fn corrupt(&self, uri: &str) -> bool {
        let mut objects = self.objects.lock().unwrap();
        let Some(object) = objects.get_mut(uri) else {
            return false;
        };
        let mut tampered = object.to_vec();
        if let Some(byte) = tampered.first_mut() {
            *byte ^= 0xff;
        } else {
            tampered.push(0xff);
        }
        *object = Bytes::from(tampered);
        true
    }

    pub fn remove(&self, uri: &str) -> bool {
        self.objects.lock().unwrap().remove(uri).is_some()
    }

    pub fn insert(&self, uri: &str, data: Bytes) {
        self.objects.lock().unwrap().insert(uri.to_owned(), data);
    }

    async fn delay(&self) {
        let delay = match self.latency {
            Latency::None => return,
            Latency::Fixed(latency) => latency,
            Latency::UpTo(max) => {
                let millis = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
                Duration::from_millis(rand::thread_rng().gen_range(0..=millis))
            }
        };
        tokio::time::sleep(delay).await;
    }
}

#[async_trait::async_trait]
impl StorageBackend for MemoryBackend {
    fn protocol(&self) -> Protocol {
        self.protocol
    }

    async fn store(&self, data: Bytes) -> Result<String, StorageError> {
        let nonce = self.stores.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        if self.fail_stores.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("store rejected".to_owned()));
        }
        let digest = const_hex::encode(hash(&data));
        let uri = self.protocol.uri_for(&format!("{}{nonce:04}", &digest[..16]));
        self.objects.lock().unwrap().insert(uri.clone(), data);
        Ok(uri)
    }

    async fn retrieve(&self, uri: &str) -> Result<Bytes, StorageError> {
        self.retrieves.fetch_add(1, Ordering::SeqCst);
        self.protocol.object_id(uri)?;
        self.delay().await;
        self.objects
            .lock()
            .unwrap()
            .get(uri)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(uri.to_owned()))
    }
}
