use std::collections::{HashMap, HashSet};

/// Live set of typo-tolerance states with pending deltas
///
/// States are nodes of an implicit trie: the child of `s` for mapped
/// character `c` (1..=alphabet_size) is `s * (alphabet_size + 1) + c`, the
/// root is 0. Next to the member set it counts, for every node, how many
/// members sit at or below it so a walk can skip empty subtrees.
#[derive(Debug, Clone)]
pub struct StateSet {
    alphabet_size: u32,
    states: HashSet<u64>,
    reachable: HashMap<u64, u32>,
    added: HashSet<u64>,
    removed: HashSet<u64>,
}

impl StateSet {
    pub fn new(alphabet_size: u32) -> Self {
        StateSet {
            alphabet_size: alphabet_size.max(1),
            states: HashSet::new(),
            reachable: HashMap::new(),
            added: HashSet::new(),
            removed: HashSet::new(),
        }
    }

    pub fn alphabet_size(&self) -> u32 {
        self.alphabet_size
    }

    /// Replace the contents with persisted states; deltas are cleared
    pub fn load(&mut self, states: impl IntoIterator<Item = u64>) {
        self.states.clear();
        self.reachable.clear();
        self.added.clear();
        self.removed.clear();

        for state in states {
            if self.states.insert(state) {
                self.adjust(state, true);
            }
        }
    }

    pub fn add(&mut self, state: u64) -> bool {
        if !self.states.insert(state) {
            return false;
        }
        self.adjust(state, true);
        if !self.removed.remove(&state) {
            self.added.insert(state);
        }
        true
    }

    pub fn remove(&mut self, state: u64) -> bool {
        if !self.states.remove(&state) {
            return false;
        }
        self.adjust(state, false);
        if !self.added.remove(&state) {
            self.removed.insert(state);
        }
        true
    }

    pub fn has(&self, state: u64) -> bool {
        self.states.contains(&state)
    }

    /// Members at or below `node`
    pub fn reachable(&self, node: u64) -> u32 {
        self.reachable.get(&node).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }

    /// Pending (added, removed) since the last load or take
    pub fn take_deltas(&mut self) -> (HashSet<u64>, HashSet<u64>) {
        (
            std::mem::take(&mut self.added),
            std::mem::take(&mut self.removed),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = &u64> {
        self.states.iter()
    }

    fn adjust(&mut self, state: u64, increment: bool) {
        let base = self.alphabet_size as u64 + 1;
        let mut node = state;

        loop {
            if increment {
                *self.reachable.entry(node).or_insert(0) += 1;
            } else if let Some(count) = self.reachable.get_mut(&node) {
                *count -= 1;
                if *count == 0 {
                    self.reachable.remove(&node);
                }
            }

            if node == 0 {
                break;
            }
            node /= base;
        }
    }
}
