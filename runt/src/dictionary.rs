use log::debug;

use crate::{
    ByteId, COPY_LINK, CellId, CopyId, Procedure, StrRef, Value, Vm, VmError, VmResult,
};

pub const DICT_BUCKETS: usize = 128;
pub const HASH_PRIME: u32 = 0x7FFF_FFFF;

/// How names are hashed and matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DictionaryMode {
    /// Hash folds only the first byte of the name, once per byte of
    /// length. The byte is sign extended first, so names starting at 0x80
    /// or above land where a signed `char` would put them. Lookups scan
    /// oldest first and match when the stored name starts with the query,
    /// so the first definition of a name wins.
    #[default]
    Compatible,
    /// Full per-byte DJB2 hash and exact name comparison. The most recent
    /// definition of a name wins.
    Strict,
}

/// Bucket index of `name`.
#[must_use]
pub fn hash(name: &[u8], mode: DictionaryMode) -> usize {
    let first = name.first().copied().unwrap_or(0);
    let mut h: u32 = 5381;
    for &byte in name {
        let folded = match mode {
            DictionaryMode::Compatible => first as i8 as u32,
            DictionaryMode::Strict => u32::from(byte),
        };
        h = (h << 5).wrapping_add(h) ^ folded;
        h %= HASH_PRIME;
    }
    h as usize % DICT_BUCKETS
}

/// Handle to an entry record in the byte arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(ByteId);

// little-endian u32 fields; 0 stands for "none" in the optional ones
const ENTRY_CELL: usize = 0;
const ENTRY_COPY: usize = 4;
const ENTRY_NAME: usize = 8;
const ENTRY_NAME_LEN: usize = 12;
const ENTRY_NEXT: usize = 16;
pub const ENTRY_SIZE: usize = 20;

/// Decoded view of an entry record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub cell: CellId,
    pub copy: CopyId,
    pub name: Value,
}

#[derive(Debug, Clone, Copy, Default)]
struct Bucket {
    size: u32,
    head: Option<EntryId>,
    tail: Option<EntryId>,
}

/// Append-only hash table of entries. Bucket chains are threaded through
/// the entry records themselves.
#[derive(Debug, Clone)]
pub struct Dictionary {
    buckets: [Bucket; DICT_BUCKETS],
    mode: DictionaryMode,
    len: usize,
}

impl Dictionary {
    pub(crate) fn new(mode: DictionaryMode) -> Self {
        Self {
            buckets: [Bucket::default(); DICT_BUCKETS],
            mode,
            len: 0,
        }
    }

    #[must_use]
    pub fn mode(&self) -> DictionaryMode {
        self.mode
    }

    /// Number of defined entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of entries chained in bucket `index`.
    #[must_use]
    pub fn bucket_size(&self, index: usize) -> usize {
        self.buckets.get(index).map_or(0, |b| b.size as usize)
    }
}

impl Vm<'_> {
    #[must_use]
    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Allocates an unnamed entry for `cell` that links by default.
    pub fn entry_create(&mut self, cell: CellId) -> VmResult<EntryId> {
        self.cells.get(cell)?;
        let id = EntryId(self.bytes.allocate(ENTRY_SIZE)?);
        self.bytes.write_u32(id.0, ENTRY_CELL, cell.get())?;
        self.bytes.write_u32(id.0, ENTRY_COPY, COPY_LINK.get())?;
        Ok(id)
    }

    pub fn entry(&self, id: EntryId) -> VmResult<Entry> {
        let cell = CellId::new(self.bytes.read_u32(id.0, ENTRY_CELL)?)
            .ok_or(VmError::InvalidHandle)?;
        let copy = CopyId::from_raw(self.bytes.read_u32(id.0, ENTRY_COPY)?);
        let name = match ByteId::new(self.bytes.read_u32(id.0, ENTRY_NAME)?) {
            Some(name) => Value::String(StrRef {
                id: name,
                len: self.bytes.read_u32(id.0, ENTRY_NAME_LEN)?,
            }),
            None => Value::Nil,
        };
        Ok(Entry { cell, copy, name })
    }

    pub fn entry_cell(&self, id: EntryId) -> VmResult<CellId> {
        Ok(self.entry(id)?.cell)
    }

    pub fn entry_name(&self, id: EntryId) -> VmResult<&str> {
        let name = self.entry(id)?.name;
        self.to_str(name)
    }

    pub fn entry_set_copy(&mut self, id: EntryId, copy: CopyId) -> VmResult<()> {
        self.copy_proc(copy)?;
        self.bytes.write_u32(id.0, ENTRY_COPY, copy.get())
    }

    /// Wires the entry's cell into `dest` using the entry's copy procedure.
    pub fn entry_copy(&mut self, id: EntryId, dest: CellId) -> VmResult<()> {
        let entry = self.entry(id)?;
        let copy = self.copy_proc(entry.copy)?;
        copy(self, entry.cell, dest)
    }

    pub fn entry_exec(&mut self, id: EntryId) -> VmResult<()> {
        let cell = self.entry_cell(id)?;
        self.exec(cell)
    }

    fn entry_next(&self, id: EntryId) -> VmResult<Option<EntryId>> {
        Ok(ByteId::new(self.bytes.read_u32(id.0, ENTRY_NEXT)?).map(EntryId))
    }

    /// Names `entry` and appends it to its bucket.
    pub fn define(&mut self, name: &str, entry: EntryId) -> VmResult<()> {
        if !self.entry(entry)?.name.is_nil() {
            return Err(VmError::AlreadyDefined);
        }

        let index = hash(name.as_bytes(), self.dictionary.mode);
        let stored = self.mk_string(name)?.as_str_ref()?;
        self.bytes.write_u32(entry.0, ENTRY_NAME, stored.id.get())?;
        self.bytes.write_u32(entry.0, ENTRY_NAME_LEN, stored.len)?;

        let bucket = self.dictionary.buckets[index];
        match bucket.tail {
            Some(tail) => self.bytes.write_u32(tail.0, ENTRY_NEXT, entry.0.get())?,
            None => self.dictionary.buckets[index].head = Some(entry),
        }
        let bucket = &mut self.dictionary.buckets[index];
        bucket.tail = Some(entry);
        bucket.size += 1;
        self.dictionary.len += 1;

        debug!("defined '{name}' in bucket {index}");
        Ok(())
    }

    /// Resolves `name` to an entry.
    pub fn search(&self, name: &str) -> VmResult<EntryId> {
        let mode = self.dictionary.mode;
        let query = name.as_bytes();
        let bucket = self.dictionary.buckets[hash(query, mode)];

        let mut found = None;
        let mut cursor = bucket.head;
        for _ in 0..bucket.size {
            let Some(id) = cursor else { break };
            let stored = self.entry(id)?.name.as_str_ref()?;
            let stored = self.bytes.bytes(stored.id, stored.len())?;

            let matched = match mode {
                DictionaryMode::Compatible => stored.starts_with(query),
                DictionaryMode::Strict => stored == query,
            };
            if matched {
                found = Some(id);
                if mode == DictionaryMode::Compatible {
                    break;
                }
            }
            cursor = self.entry_next(id)?;
        }

        found.ok_or(VmError::NotFound)
    }

    /// Allocates a cell bound to `procedure` and defines it as `name`.
    pub fn word_define(&mut self, name: &str, procedure: Procedure) -> VmResult<EntryId> {
        let cell = self.new_cell()?;
        self.bind(cell, procedure)?;
        let entry = self.entry_create(cell)?;
        self.define(name, entry)?;
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{COPY_IMMEDIATE, Cell, VmCreateInfo, VmSettings, proc_zero};

    fn with_vm<R>(mode: DictionaryMode, f: impl FnOnce(&mut Vm<'_>) -> R) -> R {
        let mut bytes = [0u8; 1024];
        let mut cells = [Cell::EMPTY; 32];
        let mut vm = Vm::new(VmCreateInfo {
            bytes: &mut bytes,
            cells: &mut cells,
            settings: VmSettings {
                dictionary: mode,
                ..VmSettings::default()
            },
        });
        f(&mut vm)
    }

    fn push_one(vm: &mut Vm<'_>, _payload: Value) -> VmResult<()> {
        vm.stack.push_float(1.0)
    }

    #[test]
    fn compatible_hash_only_sees_first_byte_and_length() {
        let mode = DictionaryMode::Compatible;
        assert_eq!(hash(b"foo", mode), hash(b"fzz", mode));
        assert_ne!(hash(b"foo", mode), hash(b"fooo", mode));
        assert_eq!(hash(b"", mode), 5381 % DICT_BUCKETS);

        // one round by hand: (5381 * 33) ^ 'a'
        let expected = ((5381u32 * 33) ^ u32::from(b'a')) % HASH_PRIME;
        assert_eq!(hash(b"a", mode), expected as usize % DICT_BUCKETS);
    }

    #[test]
    fn compatible_hash_sign_extends_high_bytes() {
        let mode = DictionaryMode::Compatible;
        let expected = ((5381u32 * 33) ^ 0xFFFF_FFC3) % HASH_PRIME;
        assert_eq!(hash(&[0xC3], mode), expected as usize % DICT_BUCKETS);

        let strict = ((5381u32 * 33) ^ 0xC3) % HASH_PRIME;
        assert_eq!(
            hash(&[0xC3], DictionaryMode::Strict),
            strict as usize % DICT_BUCKETS
        );
    }

    #[test]
    fn strict_hash_sees_every_byte() {
        let mode = DictionaryMode::Strict;
        assert_eq!(hash(b"a", mode), hash(b"a", DictionaryMode::Compatible));
        assert_ne!(hash(b"foo", mode), hash(b"fzz", mode));
    }

    #[test]
    fn define_then_search() {
        with_vm(DictionaryMode::Compatible, |vm| {
            let entry = vm.word_define("foo", push_one).unwrap();
            assert_eq!(vm.search("foo").unwrap(), entry);
            assert_eq!(vm.entry_name(entry).unwrap(), "foo");
            assert_eq!(vm.entry(entry).unwrap().copy, COPY_LINK);
            assert_eq!(vm.dictionary().len(), 1);
            assert_eq!(vm.search("bar"), Err(VmError::NotFound));
        });
    }

    #[test]
    fn colliding_name_is_not_found() {
        with_vm(DictionaryMode::Compatible, |vm| {
            vm.word_define("foo", push_one).unwrap();
            // same first byte and length: same bucket, different name
            assert_eq!(
                hash(b"fzz", DictionaryMode::Compatible),
                hash(b"foo", DictionaryMode::Compatible)
            );
            assert_eq!(vm.search("fzz"), Err(VmError::NotFound));
            let bucket = hash(b"foo", DictionaryMode::Compatible);
            assert_eq!(vm.dictionary().bucket_size(bucket), 1);
        });
    }

    #[test]
    fn first_definition_wins_in_compatible_mode() {
        with_vm(DictionaryMode::Compatible, |vm| {
            let first = vm.word_define("dup", push_one).unwrap();
            let second = vm.word_define("dup", proc_zero).unwrap();
            assert_ne!(first, second);
            assert_eq!(vm.search("dup").unwrap(), first);
        });
    }

    #[test]
    fn latest_definition_wins_in_strict_mode() {
        with_vm(DictionaryMode::Strict, |vm| {
            vm.word_define("dup", push_one).unwrap();
            let second = vm.word_define("dup", proc_zero).unwrap();
            assert_eq!(vm.search("dup").unwrap(), second);
        });
    }

    #[test]
    fn prefix_match_within_a_bucket() {
        // "ab" is hashed like "aa", so a query of "aa" lands in its bucket
        // and only compares as many bytes as the query has.
        with_vm(DictionaryMode::Compatible, |vm| {
            let entry = vm.word_define("ab", push_one).unwrap();
            assert_eq!(vm.search("a"), Err(VmError::NotFound));
            assert_eq!(vm.search("ab").unwrap(), entry);
            assert_eq!(vm.search("aa"), Err(VmError::NotFound));
        });

        with_vm(DictionaryMode::Strict, |vm| {
            vm.word_define("ab", push_one).unwrap();
            assert_eq!(vm.search("a"), Err(VmError::NotFound));
        });
    }

    #[test]
    fn stored_name_longer_than_query_matches_its_prefix() {
        let mode = DictionaryMode::Compatible;
        // 'd' names of length 2 and 4 share a bucket
        assert_eq!(hash(b"dr", mode), hash(b"drop", mode));

        with_vm(mode, |vm| {
            let drop = vm.word_define("drop", push_one).unwrap();
            assert_eq!(vm.search("dr").unwrap(), drop);
            assert_eq!(vm.search("dx"), Err(VmError::NotFound));
            assert_eq!(vm.dictionary().bucket_size(hash(b"dr", mode)), 1);
        });

        with_vm(DictionaryMode::Strict, |vm| {
            let drop = vm.word_define("drop", push_one).unwrap();
            assert_eq!(vm.search("dr"), Err(VmError::NotFound));
            assert_eq!(vm.search("drop").unwrap(), drop);
        });
    }

    #[test]
    fn chains_keep_insertion_order() {
        with_vm(DictionaryMode::Compatible, |vm| {
            let a = vm.word_define("qa", push_one).unwrap();
            let b = vm.word_define("qb", push_one).unwrap();
            let c = vm.word_define("qc", push_one).unwrap();

            let bucket = hash(b"qa", DictionaryMode::Compatible);
            assert_eq!(vm.dictionary().bucket_size(bucket), 3);
            assert_eq!(vm.search("qa").unwrap(), a);
            assert_eq!(vm.search("qb").unwrap(), b);
            assert_eq!(vm.search("qc").unwrap(), c);
        });
    }

    #[test]
    fn defining_twice_is_rejected() {
        with_vm(DictionaryMode::Compatible, |vm| {
            let entry = vm.word_define("once", push_one).unwrap();
            assert_eq!(vm.define("again", entry), Err(VmError::AlreadyDefined));
            assert_eq!(vm.dictionary().len(), 1);
        });
    }

    #[test]
    fn entry_copy_uses_the_entry_strategy() {
        with_vm(DictionaryMode::Compatible, |vm| {
            let entry = vm.word_define("one", push_one).unwrap();
            let source = vm.entry_cell(entry).unwrap();

            let linked = vm.new_cell().unwrap();
            vm.entry_copy(entry, linked).unwrap();
            assert_eq!(vm.cell(linked).unwrap().payload(), Value::Cell(source));

            vm.entry_set_copy(entry, COPY_IMMEDIATE).unwrap();
            let immediate = vm.new_cell().unwrap();
            vm.entry_copy(entry, immediate).unwrap();
            assert_eq!(vm.stack.depth(), 1);

            vm.entry_exec(entry).unwrap();
            assert_eq!(vm.stack.depth(), 2);

            let bogus = CopyId::from_raw(15);
            assert_eq!(
                vm.entry_set_copy(entry, bogus),
                Err(VmError::UnknownCopyProc(bogus))
            );
            assert_eq!(vm.entry(entry).unwrap().copy, COPY_IMMEDIATE);
        });
    }

    #[test]
    fn define_fails_cleanly_when_arena_is_full() {
        let mut bytes = [0u8; ENTRY_SIZE + 2];
        let mut cells = [Cell::EMPTY; 4];
        let mut vm = Vm::new(VmCreateInfo {
            bytes: &mut bytes,
            cells: &mut cells,
            settings: VmSettings::default(),
        });

        let cell = vm.new_cell().unwrap();
        let entry = vm.entry_create(cell).unwrap();
        assert!(matches!(
            vm.define("long-name", entry),
            Err(VmError::ByteArenaFull { .. })
        ));
        assert_eq!(vm.dictionary().len(), 0);
        assert_eq!(vm.search("long-name"), Err(VmError::NotFound));
    }
}
