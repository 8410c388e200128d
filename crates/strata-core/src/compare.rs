//! State comparator: turn freshly parsed module facts into link/unlink operations

use crate::error::GraphResult;
use crate::model::{ClassEntry, Identity, ModuleEntry, RelationKind, Triple};
use crate::store::RelationStore;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Bring the facts recorded for `module_path` in `store` in line with `entry`.
///
/// `None`, or an entry without classes, removes the module. Returns whether
/// any relation was linked or unlinked.
pub fn compare_module<S: RelationStore + ?Sized>(
    store: &mut S,
    module_path: &str,
    entry: Option<&ModuleEntry>,
) -> GraphResult<bool> {
    let entry = entry.filter(|e| !e.classes.is_empty());
    let module = Identity::module(module_path);
    let mut changed = false;

    let wanted: BTreeMap<Identity, &ClassEntry> = entry
        .map(|e| {
            e.classes
                .values()
                .map(|c| (Identity::class(module_path, &c.name), c))
                .collect()
        })
        .unwrap_or_default();

    for class in store.objects(module, RelationKind::Class) {
        let class_entry = wanted.get(&class).copied();
        let kept_methods: BTreeSet<Identity> = class_entry
            .map(|c| {
                c.methods
                    .values()
                    .map(|m| Identity::method(module_path, &c.qualified_name(m)))
                    .collect()
            })
            .unwrap_or_default();

        for method in store.objects(class, RelationKind::Method) {
            if kept_methods.contains(&method) {
                continue;
            }
            for body in store.objects(method, RelationKind::MethodBody) {
                unlink_and_collect(store, Triple::new(method, RelationKind::MethodBody, body))?;
            }
            let label = store.label(method).unwrap_or_default();
            unlink_and_collect(store, Triple::new(class, RelationKind::Method, method))?;
            debug!("- Method {} ({})", label, method);
            changed = true;
        }

        if class_entry.is_none() {
            let label = store.label(class).unwrap_or_default();
            unlink_and_collect(store, Triple::new(module, RelationKind::Class, class))?;
            debug!("- Class {}", label);
            changed = true;
        }
    }

    let module_link = Triple::new(Identity::ROOT, RelationKind::Module, module);
    let module_existed = store.contains(&module_link);

    let Some(entry) = entry else {
        if module_existed {
            unlink_and_collect(store, module_link)?;
            debug!("- Module {}", module_path);
            changed = true;
        }
        return Ok(changed);
    };

    if !module_existed {
        store.set_label(module, module_path);
        store.link(module_link)?;
        debug!("+ Module {}", module_path);
        changed = true;
    }

    for (&class, class_entry) in &wanted {
        let class_link = Triple::new(module, RelationKind::Class, class);
        if !store.contains(&class_link) {
            store.set_label(class, &class_entry.name);
            store.link(class_link)?;
            debug!("+ Class {}", class_entry.name);
            changed = true;
        }

        for method_entry in class_entry.methods.values() {
            let qualified = class_entry.qualified_name(method_entry);
            let method = Identity::method(module_path, &qualified);
            let body = method_entry.body_hash;
            let previous = store.objects(method, RelationKind::MethodBody);

            let method_link = Triple::new(class, RelationKind::Method, method);
            if !store.contains(&method_link) {
                store.set_label(method, &qualified);
                store.link(method_link)?;
                debug!("+ Method {} ({})", qualified, body);
                changed = true;
            }

            if previous.contains(&body) {
                continue;
            }
            store.set_label(body, &method_entry.body_text);
            store.link(Triple::new(method, RelationKind::MethodBody, body))?;
            changed = true;
            for stale in previous {
                unlink_and_collect(store, Triple::new(method, RelationKind::MethodBody, stale))?;
                debug!("* Method {} ({})", qualified, body);
            }
        }
    }

    Ok(changed)
}

fn unlink_and_collect<S: RelationStore + ?Sized>(store: &mut S, triple: Triple) -> GraphResult<()> {
    store.unlink(triple)?;
    store.collect(triple.object);
    store.collect(triple.subject);
    Ok(())
}
