use crate::{
    StationError,
    record::{AccessLogRecord, Uid},
    registry::{position_of, remove_key},
    ring::RingStore,
};

/// Maximum number of access attempts held in memory.
pub const LOG_CAPACITY: usize = 273;

/// Bounded history of access attempts, oldest first.
///
/// When full, adding a record evicts the oldest one.
#[derive(Debug, Default)]
pub struct AccessLogRegistry {
    records: RingStore<AccessLogRecord, LOG_CAPACITY>,
}

impl AccessLogRegistry {
    pub const fn new() -> Self {
        Self {
            records: RingStore::new(),
        }
    }

    /// Appends an attempt; returns the evicted record if the log was full.
    pub fn add(&mut self, uid: Uid, timestamp: u32, authorized: bool) -> Option<AccessLogRecord> {
        self.push(AccessLogRecord::new(uid, timestamp, authorized))
    }

    pub fn add_hex(
        &mut self,
        uid: &str,
        timestamp: u32,
        authorized: bool,
    ) -> Result<Option<AccessLogRecord>, StationError> {
        Ok(self.add(uid.parse()?, timestamp, authorized))
    }

    pub fn push(&mut self, record: AccessLogRecord) -> Option<AccessLogRecord> {
        let evicted = self.records.enqueue_evicting(record);
        if let Some(old) = &evicted {
            ::log::debug!("access log full, aged out entry at {}", old.timestamp());
        }
        evicted
    }

    pub fn get(&self, index: usize) -> Option<&AccessLogRecord> {
        self.records.get(index)
    }

    pub fn find_by_uid(&self, uid: &Uid) -> Option<usize> {
        position_of(&self.records, uid)
    }

    pub fn remove(&mut self, index: usize) -> Option<AccessLogRecord> {
        self.records.remove(index)
    }

    pub fn remove_uid(&mut self, uid: &Uid) -> Option<AccessLogRecord> {
        remove_key(&mut self.records, uid)
    }

    pub fn remove_hex(&mut self, uid: &str) -> Result<Option<AccessLogRecord>, StationError> {
        Ok(self.remove_uid(&uid.parse()?))
    }

    pub fn iter(&self) -> impl Iterator<Item = &AccessLogRecord> + '_ {
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

impl core::ops::Index<usize> for AccessLogRegistry {
    type Output = AccessLogRecord;

    fn index(&self, index: usize) -> &AccessLogRecord {
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
    fn add_find_remove() {
        let mut log = AccessLogRegistry::new();
        log.add(uid(1), 10, true);
        log.add(uid(2), 20, false);
        log.add(uid(1), 30, true);

        assert_eq!(log.find_by_uid(&uid(1)), Some(0));
        assert_eq!(log.remove_uid(&uid(1)).unwrap().timestamp(), 10);
        assert_eq!(log.find_by_uid(&uid(1)), Some(1));
        assert_eq!(log[0].timestamp(), 20);
        assert!(!log[0].authorized());
        assert_eq!(log.remove_uid(&uid(7)), None);
    }

    #[test]
    fn full_log_ages_out_oldest() {
        let mut log = AccessLogRegistry::new();
        for t in 0..LOG_CAPACITY as u32 {
            assert!(log.add(uid(1), t, true).is_none());
        }

        let evicted = log.add(uid(2), 9999, false).unwrap();
        assert_eq!(evicted.timestamp(), 0);
        assert_eq!(log.len(), LOG_CAPACITY);
        assert_eq!(log[0].timestamp(), 1);
        assert_eq!(log[LOG_CAPACITY - 1].timestamp(), 9999);
    }

    #[test]
    fn hex_paths() {
        let mut log = AccessLogRegistry::new();
        log.add_hex("05050505050505050505", 1, true).unwrap();
        assert_eq!(log.find_by_uid(&uid(5)), Some(0));
        assert_eq!(log.add_hex("nothex", 1, true), Err(StationError::InvalidUid));
        assert!(log.remove_hex("05050505050505050505").unwrap().is_some());
        assert!(log.is_empty());
    }
}
