use super::*;
use crate::subgraphs::DirectiveSiteWalker;

/// Collect the directives that appear in the federated graph from all the
/// sites that contribute to a composed element.
pub(super) fn collect_composed_directives<'a>(
    sites: impl Iterator<Item = DirectiveSiteWalker<'a>> + Clone,
) -> Vec<ir::Directive> {
    let mut directives = Vec::new();
    let mut tags: BTreeSet<StringId> = BTreeSet::new();
    let mut is_inaccessible = false;
    let mut authenticated = false;
    let mut requires_scopes: Vec<Vec<StringId>> = Vec::new();
    let mut extra_directives = Vec::new();

    if let Some(deprecated) = sites.clone().find_map(|site| site.deprecated()) {
        directives.push(ir::Directive::Deprecated {
            reason: deprecated.reason,
        });
    }

    for site in sites.clone() {
        tags.extend(site.tags().map(|tag| tag.id));

        // The directive is added whenever it's applied in any subgraph.
        is_inaccessible = is_inaccessible || site.inaccessible();
        authenticated = authenticated || site.authenticated();

        requires_scopes.extend(site.requires_scopes().iter().cloned());

        for (name, arguments) in site.iter_composed_directives() {
            extra_directives.push(ir::Directive::Other {
                name,
                arguments: arguments.clone(),
            });
        }
    }

    if is_inaccessible {
        directives.push(ir::Directive::Inaccessible);
    }

    if authenticated {
        directives.push(ir::Directive::Authenticated);
    }

    requires_scopes.sort();
    requires_scopes.dedup();

    if !requires_scopes.is_empty() {
        directives.push(ir::Directive::RequiresScopes(requires_scopes));
    }

    for tag in tags {
        directives.push(ir::Directive::Tag(tag));
    }

    extra_directives.dedup();
    directives.extend(extra_directives);

    directives
}
