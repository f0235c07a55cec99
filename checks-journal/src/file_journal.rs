use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use log::{debug, info, warn};

use checks_core::config::LedgerConfig;
use checks_core::events::EventRecord;

use crate::error::JournalError;
use crate::journal_traits::{ChainHead, EventJournal, JournalEntry};

/// Size of the little-endian length prefix in front of every frame
const FRAME_PREFIX_LEN: u64 = 8;

/// Largest frame body the journal will read. Event records are a few hundred
/// bytes, so anything bigger is a corrupt prefix.
pub const MAX_FRAME_LEN: u64 = 1 << 20;

struct JournalState {
    file: File,
    /// Byte length of the file up to the end of the last complete frame
    len: u64,
    /// A failed append may have left bytes past `len`
    dirty: bool,
    head: ChainHead,
}

/// File-backed event journal.
///
/// Each entry is stored as a little-endian u64 length followed by the
/// bincode-encoded `JournalEntry`.
pub struct FileEventJournal {
    path: PathBuf,
    state: Mutex<JournalState>,
}

impl FileEventJournal {
    /// Open or create the journal at `path`.
    ///
    /// Existing entries are replayed and their hash chain verified before
    /// anything new can be appended. An incomplete frame at the end of the
    /// file, left by a write that never finished, is cut off.
    pub fn open(path: &Path) -> Result<Self, JournalError> {
        let mut head = ChainHead::default();
        let mut replayed = 0u64;
        let mut len = 0u64;
        if path.exists() {
            let mut frames = EntryIterator::new(File::open(path)?)?;
            for entry in frames.by_ref() {
                match entry {
                    Ok(entry) => {
                        head.accept(&entry)?;
                        replayed += 1;
                    }
                    Err(JournalError::TornFrame { offset }) => {
                        warn!(
                            "Event journal {} ends in an incomplete frame at byte {}",
                            path.display(),
                            offset
                        );
                        break;
                    }
                    Err(e) => return Err(e),
                }
            }
            len = frames.offset;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let on_disk = file.metadata()?.len();
        if on_disk > len {
            file.set_len(len)?;
            info!(
                "Truncated event journal {} from {} to {} bytes",
                path.display(),
                on_disk,
                len
            );
        }

        info!(
            "Opened event journal {} with {} entries",
            path.display(),
            replayed
        );
        Ok(Self {
            path: path.to_path_buf(),
            state: Mutex::new(JournalState {
                file,
                len,
                dirty: false,
                head,
            }),
        })
    }

    /// Open the journal named by `config`, if it names one
    pub fn from_config(config: &LedgerConfig) -> Result<Option<Self>, JournalError> {
        config
            .journal_path
            .as_deref()
            .map(Self::open)
            .transpose()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, JournalState>, JournalError> {
        self.state
            .lock()
            .map_err(|e| JournalError::Poisoned(e.to_string()))
    }
}

fn encode_frame(entry: &JournalEntry) -> Result<Vec<u8>, JournalError> {
    let serialized = bincode::serialize(entry)?;
    let mut frame = Vec::with_capacity(FRAME_PREFIX_LEN as usize + serialized.len());
    frame.extend_from_slice(&(serialized.len() as u64).to_le_bytes());
    frame.extend_from_slice(&serialized);
    Ok(frame)
}

impl EventJournal for FileEventJournal {
    fn append(&self, record: &EventRecord) -> Result<JournalEntry, JournalError> {
        let mut guard = self.lock()?;
        let state = &mut *guard;

        let entry = state.head.next_entry(record)?;
        let frame = encode_frame(&entry)?;

        if state.dirty {
            state.file.set_len(state.len)?;
            state.dirty = false;
        }

        if let Err(e) = state.file.write_all(&frame).and_then(|()| state.file.flush()) {
            // Drop whatever part of the frame reached the file
            state.dirty = true;
            match state.file.set_len(state.len) {
                Ok(()) => state.dirty = false,
                Err(rollback) => warn!(
                    "Could not roll back journal {} to {} bytes: {}",
                    self.path.display(),
                    state.len,
                    rollback
                ),
            }
            return Err(e.into());
        }

        state.len += frame.len() as u64;
        state.head.accept(&entry)?;
        debug!("Journaled event {}", entry.sequence());
        Ok(entry)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = Result<JournalEntry, JournalError>> + '_> {
        match File::open(&self.path)
            .map_err(JournalError::from)
            .and_then(EntryIterator::new)
        {
            Ok(frames) => Box::new(frames),
            Err(e) => Box::new(std::iter::once(Err(e))),
        }
    }

    fn last_sequence(&self) -> Result<Option<u64>, JournalError> {
        Ok(self.lock()?.head.last_sequence)
    }
}

/// Iterator over journal frames.
///
/// Reads up to the file length seen when it was created and stops after the
/// first error.
struct EntryIterator {
    reader: BufReader<File>,
    /// Byte offset just past the last frame read successfully
    offset: u64,
    end: u64,
    failed: bool,
}

impl EntryIterator {
    fn new(file: File) -> Result<Self, JournalError> {
        let end = file.metadata()?.len();
        Ok(Self {
            reader: BufReader::new(file),
            offset: 0,
            end,
            failed: false,
        })
    }

    fn read_frame(&mut self) -> Result<Option<JournalEntry>, JournalError> {
        let remaining = self.end - self.offset;
        if remaining == 0 {
            return Ok(None);
        }
        if remaining < FRAME_PREFIX_LEN {
            return Err(JournalError::TornFrame {
                offset: self.offset,
            });
        }

        let mut len_buf = [0u8; FRAME_PREFIX_LEN as usize];
        self.reader.read_exact(&mut len_buf)?;

        let entry_len = u64::from_le_bytes(len_buf);
        if entry_len > MAX_FRAME_LEN {
            return Err(JournalError::Serialization(format!(
                "frame at byte {} claims {} bytes, limit is {}",
                self.offset, entry_len, MAX_FRAME_LEN
            )));
        }
        if entry_len > remaining - FRAME_PREFIX_LEN {
            return Err(JournalError::TornFrame {
                offset: self.offset,
            });
        }

        let mut entry_data = vec![0u8; entry_len as usize];
        self.reader.read_exact(&mut entry_data)?;
        let entry = bincode::deserialize(&entry_data)?;

        self.offset += FRAME_PREFIX_LEN + entry_len;
        Ok(Some(entry))
    }
}

impl Iterator for EntryIterator {
    type Item = Result<JournalEntry, JournalError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.read_frame() {
            Ok(entry) => entry.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
