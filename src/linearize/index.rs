use crate::grammar::{Concrete, FId, FunId, Production};
use crate::symbol::CId;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Argument instances of an `Apply` production, in order.
pub type ArgKey = SmallVec<[FId; 4]>;

/// A production that realizes a function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IndexEntry {
    /// Instance the production belongs to.
    pub fid: FId,
    pub fun: FunId,
}

#[derive(Clone, Debug, Default)]
struct FunEntries {
    /// Signatures in grammar order.
    signatures: Vec<(ArgKey, Vec<IndexEntry>)>,
    by_key: FxHashMap<ArgKey, usize>,
}

/// Lookup tables for generation in one concrete syntax.
#[derive(Clone, Debug, Default)]
pub struct LinIndex {
    funs: FxHashMap<CId, FunEntries>,
    supers: FxHashMap<FId, SmallVec<[FId; 2]>>,
}

impl LinIndex {
    pub fn build(concrete: &Concrete) -> Self {
        let mut index = LinIndex::default();
        for ccat in concrete.ccats() {
            let Some(prods) = &ccat.prods else { continue };
            for prod in prods {
                match prod {
                    Production::Apply { fun, args } => {
                        let Some(cf) = concrete.fun(*fun) else { continue };
                        let key: ArgKey = args.iter().map(|a| a.fid).collect();
                        let entries = index.funs.entry(cf.name).or_default();
                        let slot = match entries.by_key.get(&key) {
                            Some(&i) => i,
                            None => {
                                entries.by_key.insert(key.clone(), entries.signatures.len());
                                entries.signatures.push((key, Vec::new()));
                                entries.signatures.len() - 1
                            }
                        };
                        entries.signatures[slot].1.push(IndexEntry {
                            fid: ccat.fid,
                            fun: *fun,
                        });
                    }
                    Production::Coerce(target) => {
                        let supers = index.supers.entry(*target).or_default();
                        if !supers.contains(&ccat.fid) {
                            supers.push(ccat.fid);
                        }
                    }
                }
            }
        }
        index
    }

    /// Instances that coerce `fid`.
    pub fn supers(&self, fid: FId) -> &[FId] {
        self.supers.get(&fid).map(|s| s.as_slice()).unwrap_or(&[])
    }

    pub fn has_fun(&self, fun: CId) -> bool {
        self.funs.contains_key(&fun)
    }

    /// Productions of `fun` over exactly these argument instances.
    pub fn lookup(&self, fun: CId, key: &[FId]) -> &[IndexEntry] {
        self.funs
            .get(&fun)
            .and_then(|e| e.by_key.get(key).map(|&i| e.signatures[i].1.as_slice()))
            .unwrap_or(&[])
    }

    /// Productions of `fun` whose arguments match `pattern`, where None
    /// matches any instance.
    pub fn matching(&self, fun: CId, pattern: &[Option<FId>]) -> Vec<IndexEntry> {
        if pattern.iter().all(Option::is_some) {
            let key: ArgKey = pattern.iter().flatten().copied().collect();
            return self.lookup(fun, &key).to_vec();
        }
        let Some(entries) = self.funs.get(&fun) else {
            return Vec::new();
        };
        entries
            .signatures
            .iter()
            .filter(|(key, _)| {
                key.len() == pattern.len()
                    && key
                        .iter()
                        .zip(pattern)
                        .all(|(k, p)| p.map_or(true, |p| p == *k))
            })
            .flat_map(|(_, e)| e.iter().copied())
            .collect()
    }

    /// Every signature of `fun`, in grammar order.
    pub fn signatures(&self, fun: CId) -> impl Iterator<Item = (&[FId], &[IndexEntry])> {
        self.funs
            .get(&fun)
            .into_iter()
            .flat_map(|e| e.signatures.iter())
            .map(|(k, e)| (k.as_slice(), e.as_slice()))
    }
}
