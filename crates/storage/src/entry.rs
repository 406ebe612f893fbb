use tokio::time::{Duration, Instant};

/// Horizonte usado quando `now + ttl` estoura o relógio monotônico.
pub(crate) const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `now + ttl`, limitado a `FAR_FUTURE` em caso de overflow.
pub(crate) fn deadline_after(ttl: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(ttl).unwrap_or_else(|| now + FAR_FUTURE)
}

/// Uma versão armazenada: valor + instante de expiração.
#[derive(Debug, Clone)]
pub(crate) struct Entry<V> {
    pub value: V,
    pub expires_at: Instant,
}

impl<V> Entry<V> {
    pub fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: deadline_after(ttl),
        }
    }

    pub fn is_live_at(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// Todas as versões de uma chave, em ordem de inserção.
///
/// A ordem não influencia leituras: vale a versão viva com o maior
/// `expires_at`.
#[derive(Debug)]
pub(crate) struct Bucket<V> {
    entries: Vec<Entry<V>>,
}

impl<V> Bucket<V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: Entry<V>) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry<V>> {
        self.entries.iter()
    }

    fn newest_live_index(&self, now: Instant) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_live_at(now))
            .max_by_key(|(_, e)| e.expires_at)
            .map(|(i, _)| i)
    }

    pub fn newest_live(&self, now: Instant) -> Option<&Entry<V>> {
        self.newest_live_index(now).map(|i| &self.entries[i])
    }

    /// Remove e retorna só a versão mais nova ainda viva.
    pub fn take_newest_live(&mut self, now: Instant) -> Option<Entry<V>> {
        let i = self.newest_live_index(now)?;
        Some(self.entries.remove(i))
    }

    /// Descarta versões expiradas preservando a ordem relativa.
    /// Retorna quantas foram removidas.
    pub fn retain_live(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.is_live_at(now));
        before - self.entries.len()
    }
}
