//! Pass 5: INI projection of the final table.

use crate::config::Config;
use crate::table::{GlobalTable, Scope};
use serde::Serialize;

/// Render `table` as standard INI. Internal scopes are omitted; values are
/// written verbatim.
pub fn serialize(table: &GlobalTable, config: &Config) -> String {
    let sorted = config.is_sorted();
    let mut scopes: Vec<&Scope> = table.scopes().filter(|s| !s.internal).collect();
    if sorted {
        scopes.sort_by(|a, b| a.id.cmp(&b.id));
    }

    let mut out = String::new();
    for scope in scopes {
        out.push('[');
        out.push_str(&scope.id);
        out.push_str("]\n");

        let mut keys: Vec<(&String, &str)> =
            scope.keys.iter().map(|(k, v)| (k, v.raw.as_str())).collect();
        if sorted {
            keys.sort_by(|a, b| a.0.cmp(b.0));
        }
        for (key, value) in keys {
            out.push_str(key);
            out.push('=');
            out.push_str(value);
            out.push('\n');
        }
    }
    out
}

/// Object and key counts over a compiled table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub objects: usize,
    pub internal_objects: usize,
    pub keys: usize,
    pub internal_keys: usize,
}

impl Stats {
    pub fn of(table: &GlobalTable) -> Stats {
        let mut stats = Stats::default();
        for scope in table.scopes() {
            stats.objects += 1;
            stats.keys += scope.keys.len();
            if scope.internal {
                stats.internal_objects += 1;
                stats.internal_keys += scope.keys.len();
            }
        }
        stats
    }

    pub fn public_objects(&self) -> usize {
        self.objects - self.internal_objects
    }

    pub fn public_keys(&self) -> usize {
        self.keys - self.internal_keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pass1_build::build;

    fn table(src: &str) -> GlobalTable {
        build(src, "test.sini", &mut Vec::new()).unwrap()
    }

    #[test]
    fn insertion_order_by_default() {
        let t = table("[b]\nz = 1\na = 2\n[a]\nk = v\n");
        assert_eq!(
            serialize(&t, &Config::default()),
            "[__global__]\n[b]\nz=1\na=2\n[a]\nk=v\n"
        );
    }

    #[test]
    fn sorted_orders_scopes_and_keys() {
        let t = table("[b]\nz = 1\na = 2\n[a]\nk = v\n");
        let mut config = Config::default();
        config.set_sorted(true);
        assert_eq!(
            serialize(&t, &config),
            "[__global__]\n[a]\nk=v\n[b]\na=2\nz=1\n"
        );
    }

    #[test]
    fn internal_scopes_are_omitted() {
        let mut t = table("[hidden]\nk = v\n[shown]\nk = v\n");
        t.get_mut("hidden").unwrap().internal = true;
        let out = serialize(&t, &Config::default());
        assert!(!out.contains("hidden"));
        assert!(out.contains("[shown]\nk=v\n"));
    }

    #[test]
    fn values_are_not_escaped() {
        let t = table("url = a b \"c\" \\d\n");
        assert_eq!(
            serialize(&t, &Config::default()),
            "[__global__]\nurl=a b \"c\" \\d\n"
        );
    }

    #[test]
    fn stats_split_internal() {
        let mut t = table("g = 1\n[a]\nx = 1\ny = 2\n[b]\nz = 3\n");
        t.get_mut("a").unwrap().internal = true;
        let stats = Stats::of(&t);
        assert_eq!(stats.objects, 3);
        assert_eq!(stats.internal_objects, 1);
        assert_eq!(stats.keys, 4);
        assert_eq!(stats.internal_keys, 2);
        assert_eq!(stats.public_objects(), 2);
        assert_eq!(stats.public_keys(), 2);
    }
}
