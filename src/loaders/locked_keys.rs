//! Keys that always keep their source-locale value

use super::{Entries, Loader, LoaderContext, PulledState, reinsert_in_order};
use crate::error::{LoaderError, LoaderResult};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

#[derive(Debug, Clone, Default)]
struct Snapshot {
    order: Vec<String>,
    locked: Entries,
}

/// Holds back entries whose key matches a locked glob
///
/// Globs use `*` for one path segment and `**` for any number of segments. A
/// glob also locks everything below the key it matches, so `meta` locks
/// `meta/author` too. Locked values are taken from the source locale pull and
/// reinserted at their original position on every push.
#[derive(Debug)]
pub struct LockedKeysLoader {
    globs: GlobSet,
    snapshot: PulledState<Snapshot>,
}

/// Compile key globs into one set
///
/// Every glob is added twice, as written and with `/**` appended, so a
/// matching key locks its children as well.
///
/// # Errors
///
/// [`LoaderError::InvalidLockedKey`] for the first glob that does not parse.
pub fn build_key_globs(globs: &[String]) -> LoaderResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for glob in globs {
        let glob = glob.trim_end_matches('/');
        let mut patterns = vec![glob.to_string()];
        if !glob.ends_with("**") {
            patterns.push(format!("{}/**", glob));
        }
        for pattern in patterns {
            let compiled = GlobBuilder::new(&pattern)
                .literal_separator(true)
                .build()
                .map_err(|source| LoaderError::InvalidLockedKey {
                    glob: glob.to_string(),
                    source,
                })?;
            builder.add(compiled);
        }
    }
    Ok(builder.build()?)
}

impl LockedKeysLoader {
    pub fn new(globs: &[String]) -> LoaderResult<Self> {
        Ok(LockedKeysLoader {
            globs: build_key_globs(globs)?,
            snapshot: PulledState::new(),
        })
    }

    fn is_locked(&self, key: &str) -> bool {
        self.globs.is_match(key)
    }
}

impl Loader for LockedKeysLoader {
    type Input = Entries;
    type Output = Entries;

    fn name(&self) -> &'static str {
        "locked-keys"
    }

    fn pull(
        &mut self,
        locale: &str,
        input: Entries,
        ctx: &mut LoaderContext,
    ) -> LoaderResult<Entries> {
        let mut snapshot = Snapshot {
            order: input.keys().cloned().collect(),
            locked: Entries::new(),
        };
        let mut output = Entries::with_capacity(input.len());

        for (key, value) in input {
            if self.is_locked(&key) {
                snapshot.locked.insert(key, value);
            } else {
                output.insert(key, value);
            }
        }

        self.snapshot.record(locale, ctx, snapshot);
        Ok(output)
    }

    fn push(
        &mut self,
        _locale: &str,
        data: Entries,
        _ctx: &mut LoaderContext,
    ) -> LoaderResult<Entries> {
        let snapshot = self.snapshot.get(self.name())?;
        Ok(reinsert_in_order(&snapshot.order, &snapshot.locked, data))
    }
}
