use super::*;
use std::collections::HashMap;

/// Which positions a named type appears in across all subgraphs. This decides
/// the merge policy for enum values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TypeUsage {
    Input,
    Output,
    Both,
}

impl TypeUsage {
    fn add(self, other: TypeUsage) -> TypeUsage {
        if self == other {
            self
        } else {
            TypeUsage::Both
        }
    }
}

/// Context for [`compose_subgraphs`](crate::compose::compose_subgraphs).
pub(crate) struct Context<'a> {
    pub(crate) subgraphs: &'a Subgraphs,
    pub(crate) diagnostics: &'a mut Diagnostics,
    /// This should stay private, composition IR should remain write-only
    /// during composition: the subgraphs are the source of truth.
    ir: CompositionIr,
    type_usages: HashMap<StringId, TypeUsage>,
}

impl<'a> Context<'a> {
    pub(crate) fn new(subgraphs: &'a Subgraphs, diagnostics: &'a mut Diagnostics) -> Self {
        subgraphs.emit_ingestion_diagnostics(diagnostics);

        let mut context = Context {
            subgraphs,
            diagnostics,
            ir: CompositionIr::default(),
            type_usages: HashMap::new(),
        };

        context.collect_type_usages();

        for builtin_scalar in subgraphs.iter_builtin_scalars() {
            context.ir.insert_definition(ir::DefinitionIr::new(builtin_scalar.id, DefinitionKind::Scalar));
        }

        context
    }

    pub(crate) fn into_ir(self) -> CompositionIr {
        self.ir
    }

    pub(crate) fn insert_definition(&mut self, definition: ir::DefinitionIr) {
        self.ir.insert_definition(definition);
    }

    pub(crate) fn insert_field(&mut self, field: ir::FieldIr) {
        self.ir.fields.push(field);
    }

    pub(crate) fn set_query(&mut self, name: StringId) {
        self.ir.query_type = Some(name);
    }

    pub(crate) fn set_mutation(&mut self, name: StringId) {
        self.ir.mutation_type = Some(name);
    }

    pub(crate) fn set_subscription(&mut self, name: StringId) {
        self.ir.subscription_type = Some(name);
    }

    pub(crate) fn ir(&self) -> &CompositionIr {
        &self.ir
    }

    pub(crate) fn record_entity_interface(
        &mut self,
        interface_name: StringId,
        implementers: std::collections::BTreeSet<StringId>,
    ) {
        self.ir.entity_interfaces.insert(interface_name, implementers);
    }

    pub(crate) fn type_usage(&self, name: StringId) -> Option<TypeUsage> {
        self.type_usages.get(&name).copied()
    }

    /// Walk every field and argument in every subgraph once, recording
    /// whether each named type is used in input positions, output positions
    /// or both. Computed over all subgraphs up front so that the enum merge
    /// policy does not depend on subgraph order.
    fn collect_type_usages(&mut self) {
        let mut usages: HashMap<StringId, TypeUsage> = HashMap::new();

        let mut record = |name: StringId, usage: TypeUsage| {
            usages
                .entry(name)
                .and_modify(|existing| *existing = existing.add(usage))
                .or_insert(usage);
        };

        for subgraph in self.subgraphs.iter_subgraphs() {
            for definition in subgraph.definitions() {
                match definition.kind() {
                    DefinitionKind::Object | DefinitionKind::Interface => {
                        for field in definition.fields() {
                            record(field.r#type().record().definition_name, TypeUsage::Output);

                            for argument in field.arguments() {
                                record(argument.r#type().record().definition_name, TypeUsage::Input);
                            }
                        }
                    }
                    DefinitionKind::InputObject => {
                        for field in definition.fields() {
                            record(field.r#type().record().definition_name, TypeUsage::Input);
                        }
                    }
                    _ => (),
                }
            }
        }

        self.type_usages = usages;
    }
}
