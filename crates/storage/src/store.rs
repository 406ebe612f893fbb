use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use expiremap_common::{StoreError, StoreResult};

use crate::config::StoreConfig;
use crate::entry::{Bucket, Entry, FAR_FUTURE, deadline_after};

/// Resultado de uma varredura.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeStats {
    /// Versões expiradas descartadas.
    pub entries: usize,
    /// Chaves removidas por ficarem sem versões vivas.
    pub keys: usize,
}

/// Estado compartilhado entre o store e a task de limpeza.
struct Shared<K, V> {
    buckets: RwLock<HashMap<K, Bucket<V>>>,
    shutdown: Notify,
}

impl<K, V> Shared<K, V>
where
    K: Eq + Hash,
{
    fn purge(&self) -> PurgeStats {
        let mut stats = PurgeStats::default();
        let mut buckets = self.buckets.write();
        let now = Instant::now();
        buckets.retain(|_, bucket| {
            stats.entries += bucket.retain_live(now);
            if bucket.is_empty() {
                stats.keys += 1;
                false
            } else {
                true
            }
        });
        stats
    }
}

/// Mapa concorrente em que cada valor carrega um prazo de expiração.
///
/// Uma chave pode guardar várias versões ao mesmo tempo: escritas nunca
/// sobrescrevem, apenas acrescentam. Leituras devolvem a versão viva com o
/// prazo mais distante. Uma task tokio varre o mapa a cada
/// `reap_interval`, descartando versões expiradas e chaves vazias.
///
/// Todas as operações são síncronas e guardadas por um único `RwLock`.
/// A limpeza roda numa task tokio: [`ExpiringStore::new`] e `Default`
/// exigem um runtime ativo, enquanto [`ExpiringStore::with_config`] retorna
/// `StoreError::NoRuntime` sem ele.
///
/// Para compartilhar entre tasks use `Arc<ExpiringStore<K, V>>`. Ao ser
/// dropado o store sinaliza a task de limpeza para encerrar; use
/// [`ExpiringStore::shutdown`] para também aguardar o término.
pub struct ExpiringStore<K, V> {
    shared: Arc<Shared<K, V>>,
    config: StoreConfig,
    reaper: Option<JoinHandle<()>>,
}

impl<K, V> ExpiringStore<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Cria um store com intervalo de limpeza e TTL padrão de 1 minuto.
    ///
    /// # Panics
    ///
    /// Se chamado fora de um runtime tokio.
    pub fn new() -> Self {
        Self::start(StoreConfig::default(), &Handle::current())
    }

    /// Cria um store com a configuração dada, validando-a antes.
    pub fn with_config(config: StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        let handle = Handle::try_current().map_err(|_| StoreError::NoRuntime)?;
        Ok(Self::start(config, &handle))
    }

    fn start(config: StoreConfig, handle: &Handle) -> Self {
        let shared = Arc::new(Shared {
            buckets: RwLock::new(HashMap::new()),
            shutdown: Notify::new(),
        });

        let reaper = handle.spawn(reap_expired(shared.clone(), config.reap_interval));

        Self {
            shared,
            config,
            reaper: Some(reaper),
        }
    }

    pub fn config(&self) -> StoreConfig {
        self.config
    }

    // --- Escrita ---

    /// Acrescenta uma versão com o TTL padrão.
    pub fn set(&self, key: K, value: V) {
        self.set_with_ttl(key, value, self.config.default_ttl);
    }

    /// Acrescenta uma versão com TTL explícito. `Duration::ZERO` gera uma
    /// versão já expirada, que nunca será lida.
    pub fn set_with_ttl(&self, key: K, value: V, ttl: Duration) {
        let entry = Entry::new(value, ttl);
        let mut buckets = self.shared.buckets.write();
        buckets.entry(key).or_insert_with(Bucket::new).push(entry);
    }

    // --- Leitura ---

    /// Retorna a versão viva mais nova da chave.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let buckets = self.shared.buckets.read();
        let now = Instant::now();
        buckets
            .get(key)?
            .newest_live(now)
            .map(|entry| entry.value.clone())
    }

    /// Mesmo que [`get`](Self::get); par de nomenclatura de `load_or_store`.
    pub fn load<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key)
    }

    /// Retorna `(valor, true)` se há versão viva; senão grava `value` com o
    /// TTL padrão e retorna `(value, false)`. Verificação e escrita ocorrem
    /// sob o mesmo lock.
    pub fn load_or_store(&self, key: K, value: V) -> (V, bool) {
        self.load_or_store_with_ttl(key, value, self.config.default_ttl)
    }

    pub fn load_or_store_with_ttl(&self, key: K, value: V, ttl: Duration) -> (V, bool) {
        let mut buckets = self.shared.buckets.write();
        let now = Instant::now();
        let bucket = buckets.entry(key).or_insert_with(Bucket::new);

        if let Some(entry) = bucket.newest_live(now) {
            return (entry.value.clone(), true);
        }

        bucket.push(Entry::new(value.clone(), ttl));
        (value, false)
    }

    /// Remove e retorna a versão viva mais nova. As demais versões da chave
    /// ficam intactas; sem versão viva nada é alterado.
    pub fn load_and_delete<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut buckets = self.shared.buckets.write();
        let now = Instant::now();
        let bucket = buckets.get_mut(key)?;
        let entry = bucket.take_newest_live(now)?;

        // Limpar chave se o bucket ficou vazio
        if bucket.is_empty() {
            buckets.remove(key);
        }
        Some(entry.value)
    }

    /// Remove a chave com todas as suas versões. Idempotente.
    pub fn delete<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.shared.buckets.write().remove(key);
    }

    /// Visita cada par (chave, versão), inclusive versões expiradas ainda não
    /// varridas, até o visitor retornar `false`. A ordem das chaves não é
    /// definida.
    ///
    /// O lock de leitura fica retido durante a iteração: o visitor não deve
    /// chamar o próprio store.
    pub fn range<F>(&self, mut visit: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        let buckets = self.shared.buckets.read();
        for (key, bucket) in buckets.iter() {
            for entry in bucket.iter() {
                if !visit(key, &entry.value) {
                    return;
                }
            }
        }
    }

    // --- Manutenção ---

    /// Número de chaves com bucket, incluindo as que só têm versões
    /// expiradas ainda não varridas.
    pub fn len(&self) -> usize {
        self.shared.buckets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total de versões armazenadas, vivas ou não.
    pub fn entry_count(&self) -> usize {
        self.shared
            .buckets
            .read()
            .values()
            .map(Bucket::len)
            .sum()
    }

    /// Executa uma varredura imediatamente, fora da cadência da task.
    pub fn purge_expired(&self) -> PurgeStats {
        self.shared.purge()
    }

    /// Sinaliza a task de limpeza e aguarda seu término.
    pub async fn shutdown(mut self) {
        self.shared.shutdown.notify_one();
        if let Some(reaper) = self.reaper.take() {
            if let Err(e) = reaper.await {
                error!("task de limpeza falhou: {e}");
            }
        }
    }
}

/// Equivalente a [`ExpiringStore::new`].
///
/// # Panics
///
/// Se chamado fora de um runtime tokio.
impl<K, V> Default for ExpiringStore<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Drop for ExpiringStore<K, V> {
    fn drop(&mut self) {
        self.shared.shutdown.notify_one();
    }
}

/// Background task que varre versões expiradas a cada `period`.
async fn reap_expired<K, V>(shared: Arc<Shared<K, V>>, period: Duration)
where
    K: Eq + Hash,
{
    // Períodos além do relógio monotônico viram FAR_FUTURE
    let period = period.min(FAR_FUTURE);

    // Primeira varredura só depois de um período completo
    let mut ticker = time::interval_at(deadline_after(period), period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(?period, "task de limpeza iniciada");

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shared.shutdown.notified() => break,
        }

        let stats = shared.purge();
        if stats.entries > 0 {
            debug!(
                entries = stats.entries,
                keys = stats.keys,
                "versões expiradas removidas"
            );
        }
    }

    info!("task de limpeza encerrada");
}
