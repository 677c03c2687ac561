use crate::{
    StationError,
    record::{AuthenticationRecord, Uid},
    registry::{position_of, remove_key},
    ring::RingStore,
};

/// Maximum number of authorized tags held in memory.
pub const AUTH_CAPACITY: usize = 145;

/// Authorized tags with their daily windows.
///
/// Insertion does not reject a UID that is already present; callers that
/// need uniqueness check [`find_by_uid`](Self::find_by_uid) first.
#[derive(Debug, Default)]
pub struct AuthenticationRegistry {
    records: RingStore<AuthenticationRecord, AUTH_CAPACITY>,
}

impl AuthenticationRegistry {
    pub const fn new() -> Self {
        Self {
            records: RingStore::new(),
        }
    }

    /// Inserts a new record at the tail.
    ///
    /// # Errors
    /// * [`StationError::Full`] - if the registry already holds
    ///   [`AUTH_CAPACITY`] records
    pub fn add(
        &mut self,
        uid: Uid,
        name: &str,
        interval_start: u32,
        interval_end: u32,
    ) -> Result<(), StationError> {
        self.push(AuthenticationRecord::new(uid, name, interval_start, interval_end))
    }

    /// Like [`add`](Self::add), with the UID given as 20 hex digits.
    pub fn add_hex(
        &mut self,
        uid: &str,
        name: &str,
        interval_start: u32,
        interval_end: u32,
    ) -> Result<(), StationError> {
        self.add(uid.parse()?, name, interval_start, interval_end)
    }

    pub fn push(&mut self, record: AuthenticationRecord) -> Result<(), StationError> {
        self.records.enqueue(record).map_err(|rejected| {
            ::log::warn!("authentication registry full, dropping {}", rejected.uid());
            StationError::Full
        })
    }

    pub fn get(&self, index: usize) -> Option<&AuthenticationRecord> {
        self.records.get(index)
    }

    /// Mutable access for editing a record's window.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut AuthenticationRecord> {
        self.records.get_mut(index)
    }

    /// Index of the first record for `uid`.
    pub fn find_by_uid(&self, uid: &Uid) -> Option<usize> {
        position_of(&self.records, uid)
    }

    /// True if `uid` is registered. The stored window is not consulted.
    pub fn authenticate(&self, uid: &Uid) -> bool {
        self.find_by_uid(uid).is_some()
    }

    pub fn remove(&mut self, index: usize) -> Option<AuthenticationRecord> {
        self.records.remove(index)
    }

    /// Removes the first record for `uid`; unknown UIDs are a no-op.
    pub fn remove_uid(&mut self, uid: &Uid) -> Option<AuthenticationRecord> {
        remove_key(&mut self.records, uid)
    }

    pub fn remove_hex(&mut self, uid: &str) -> Result<Option<AuthenticationRecord>, StationError> {
        Ok(self.remove_uid(&uid.parse()?))
    }

    pub fn iter(&self) -> impl Iterator<Item = &AuthenticationRecord> + '_ {
        self.records.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl core::ops::Index<usize> for AuthenticationRegistry {
    type Output = AuthenticationRecord;

    fn index(&self, index: usize) -> &AuthenticationRecord {
        &self.records[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(n: u8) -> Uid {
        Uid::from_bytes([n; 10])
    }

    #[test]
    fn add_and_find() {
        let mut reg = AuthenticationRegistry::new();
        reg.add(uid(1), "Ann", 0, 3600).unwrap();
        reg.add(uid(2), "Bob", 60, 120).unwrap();

        assert_eq!(reg.len(), 2);
        assert_eq!(reg.find_by_uid(&uid(2)), Some(1));
        assert_eq!(reg.find_by_uid(&uid(3)), None);
        assert!(reg.authenticate(&uid(1)));
        assert!(!reg.authenticate(&uid(3)));
        assert_eq!(reg[1].name().as_str(), "Bob");
    }

    #[test]
    fn duplicates_are_allowed_and_first_wins() {
        let mut reg = AuthenticationRegistry::new();
        reg.add(uid(1), "first", 0, 0).unwrap();
        reg.add(uid(1), "second", 0, 0).unwrap();

        assert_eq!(reg.len(), 2);
        assert_eq!(reg.find_by_uid(&uid(1)), Some(0));

        let removed = reg.remove_uid(&uid(1)).unwrap();
        assert_eq!(removed.name().as_str(), "first");
        assert_eq!(reg.get(0).unwrap().name().as_str(), "second");
    }

    #[test]
    fn remove_unknown_uid_is_silent() {
        let mut reg = AuthenticationRegistry::new();
        reg.add(uid(1), "Ann", 0, 0).unwrap();

        assert_eq!(reg.remove_uid(&uid(9)), None);
        assert_eq!(reg.remove(5), None);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn hex_paths() {
        let mut reg = AuthenticationRegistry::new();
        reg.add_hex("0a0a0a0a0a0a0a0a0a0a", "Ten", 0, 0).unwrap();
        assert!(reg.authenticate(&uid(10)));

        assert_eq!(
            reg.add_hex("0a0a", "Short", 0, 0),
            Err(StationError::InvalidUid)
        );
        assert_eq!(reg.remove_hex("0A0A0A0A0A0A0A0A0A0A").unwrap().unwrap().uid(), &uid(10));
        assert!(reg.is_empty());
    }

    #[test]
    fn edit_window_through_get_mut() {
        let mut reg = AuthenticationRegistry::new();
        reg.add(uid(1), "Ann", 0, 0).unwrap();

        let record = reg.get_mut(0).unwrap();
        record.set_interval_start(8 * 3600);
        record.set_interval_end(17 * 3600);

        assert_eq!(reg[0].interval_start(), 8 * 3600);
        assert_eq!(reg[0].interval_end(), 17 * 3600);
    }

    #[test]
    fn full_registry_rejects() {
        let mut reg = AuthenticationRegistry::new();
        for i in 0..AUTH_CAPACITY {
            let mut bytes = [0u8; 10];
            bytes[..8].copy_from_slice(&(i as u64).to_be_bytes());
            reg.add(Uid::from_bytes(bytes), "x", 0, 0).unwrap();
        }

        assert_eq!(reg.add(uid(0xFF), "late", 0, 0), Err(StationError::Full));
        assert_eq!(reg.len(), AUTH_CAPACITY);
        assert!(!reg.authenticate(&uid(0xFF)));
    }

    #[test]
    fn clear_empties() {
        let mut reg = AuthenticationRegistry::new();
        reg.add(uid(1), "Ann", 0, 0).unwrap();
        reg.clear();
        assert!(reg.is_empty());
        assert_eq!(reg.iter().count(), 0);
    }
}
