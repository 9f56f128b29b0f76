pub(super) const AUTHENTICATED: &str = "authenticated";
pub(super) const COMPOSE_DIRECTIVE: &str = "composeDirective";
pub(super) const EXTENDS: &str = "extends";
pub(super) const EXTERNAL: &str = "external";
pub(super) const INACCESSIBLE: &str = "inaccessible";
pub(super) const INTERFACE_OBJECT: &str = "interfaceObject";
pub(super) const KEY: &str = "key";
pub(super) const OVERRIDE: &str = "override";
pub(super) const PROVIDES: &str = "provides";
pub(super) const REQUIRES: &str = "requires";
pub(super) const REQUIRES_SCOPES: &str = "requiresScopes";
pub(super) const SHAREABLE: &str = "shareable";
pub(super) const TAG: &str = "tag";

/// The subscription filter directive is not renameable through `@link`, it
/// always goes by its prefixed name.
pub(super) const SUBSCRIPTION_FILTER: &str = "openfed__subscriptionFilter";
