use crate::{
    StationError,
    clock::Clock,
    image::{
        AUTH_RECORD_SIZE, ImageHeader, ImageLayout, LOG_RECORD_SIZE, auth_records, encode_auth,
        encode_log, log_records, region_lengths,
    },
    record::Uid,
    registry::DataLists,
    store::NonVolatileStore,
};

/// Result of [`PersistenceManager::initialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageStatus {
    /// The stored image matched the layout and was decoded.
    Loaded {
        auth: usize,
        /// Authentication records skipped because their UID was already loaded.
        duplicates: usize,
        log: usize,
    },
    /// The stored image was foreign or blank; an empty header was adopted.
    Reset,
}

/// Result of [`PersistenceManager::extract_list_from_eeprom_image`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Number of peer log records appended.
    Merged { log: usize },
    /// Header did not match the local layout; nothing changed.
    Rejected,
}

/// Maps the registries onto the EEPROM image and back.
///
/// Owns both registries, the store and the clock. The header cached here is
/// the one written by [`update_eeprom_from_list`](Self::update_eeprom_from_list).
pub struct PersistenceManager<S: NonVolatileStore, C: Clock> {
    lists: DataLists,
    store: S,
    clock: C,
    layout: ImageLayout,
    header: ImageHeader,
}

impl<S: NonVolatileStore, C: Clock> PersistenceManager<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        let layout = ImageLayout::for_capacity(store.capacity());
        Self {
            lists: DataLists::new(),
            store,
            clock,
            layout,
            header: layout.fresh_header(0),
        }
    }

    /// Loads both registries from the store's current image.
    ///
    /// A header whose structural fields differ from the layout is treated as
    /// an uninitialized store: the registries stay empty and a fresh header
    /// stamped with the current wall clock is adopted in memory only.
    /// Authentication records whose UID is already loaded are dropped.
    pub fn initialize(&mut self) -> ImageStatus {
        self.lists.clear();

        let image = self.store.image();
        let header = match ImageHeader::decode(image) {
            Some(header) if self.layout.is_compatible(&header) => header,
            _ => {
                self.header = self.layout.fresh_header(self.clock.get());
                ::log::warn!("eeprom image not initialized, starting empty");
                return ImageStatus::Reset;
            }
        };
        self.header = header;

        let mut duplicates = 0;
        for record in auth_records(image, header) {
            if self.lists.auth.find_by_uid(record.uid()).is_some() {
                duplicates += 1;
                continue;
            }
            if self.lists.auth.push(record).is_err() {
                break;
            }
        }
        for record in log_records(image, header) {
            self.lists.log.push(record);
        }

        let status = ImageStatus::Loaded {
            auth: self.lists.auth.len(),
            duplicates,
            log: self.lists.log.len(),
        };
        ::log::info!("eeprom image loaded: {:?}", status);
        status
    }

    /// Decodes the header of an externally supplied image.
    pub fn extract_eeprom_header(&self, image: &[u8]) -> Option<ImageHeader> {
        ImageHeader::decode(image)
    }

    /// Merges the log region of a peer's image into the local log.
    ///
    /// The peer's authentication region is never applied: this station is
    /// authoritative over who may enter. Images whose structural header
    /// fields differ from the local layout are rejected without changes.
    pub fn extract_list_from_eeprom_image(&mut self, image: &[u8]) -> MergeOutcome {
        let header = match self.extract_eeprom_header(image) {
            Some(header) if self.layout.is_compatible(&header) => header,
            _ => {
                ::log::warn!("peer image of {} bytes rejected: foreign layout", image.len());
                return MergeOutcome::Rejected;
            }
        };

        let mut merged = 0;
        for record in log_records(image, header) {
            self.lists.log.push(record);
            merged += 1;
        }
        ::log::info!("merged {} peer log records", merged);
        MergeOutcome::Merged { log: merged }
    }

    /// Writes the header and both regions from the registries, then commits.
    ///
    /// Records beyond a region's capacity stay in memory but are not
    /// persisted; for the log the newest records are kept.
    pub fn update_eeprom_from_list(&mut self) -> Result<(), StationError> {
        let auth_count = self.lists.auth.len().min(self.layout.auth_slots());
        if auth_count < self.lists.auth.len() {
            ::log::warn!(
                "auth region holds {} of {} records",
                auth_count,
                self.lists.auth.len()
            );
        }
        let log_count = self.lists.log.len().min(self.layout.log_slots());
        let log_skip = self.lists.log.len() - log_count;
        if log_skip > 0 {
            ::log::warn!("log region full, {} oldest records not persisted", log_skip);
        }

        (self.header.auth_length, self.header.log_length) = region_lengths(auth_count, log_count);
        self.store.write(0, &self.header.encode())?;

        let mut addr = self.header.auth_base as usize;
        for record in self.lists.auth.iter().take(auth_count) {
            self.store.write(addr as u16, &encode_auth(record))?;
            addr += AUTH_RECORD_SIZE;
        }

        let mut addr = self.header.log_base as usize;
        for record in self.lists.log.iter().skip(log_skip) {
            self.store.write(addr as u16, &encode_log(record))?;
            addr += LOG_RECORD_SIZE;
        }

        self.store.commit()
    }

    /// Authenticates a presented tag and logs the attempt at the current time.
    pub fn record_attempt(&mut self, uid: Uid) -> bool {
        let now = self.clock.get();
        self.lists.check_in(uid, now)
    }

    pub fn lists(&self) -> &DataLists {
        &self.lists
    }

    pub fn lists_mut(&mut self) -> &mut DataLists {
        &mut self.lists
    }

    /// Header as last loaded, reset or written.
    pub fn header(&self) -> &ImageHeader {
        &self.header
    }

    pub fn layout(&self) -> &ImageLayout {
        &self.layout
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
