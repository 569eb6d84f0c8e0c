use crate::{
    compile::{CompileContext, DiscriminatorTable},
    error::{ErrorClass, ErrorOrigin, InternalError},
    key::ShapeKey,
    plan::{Plan, compile_uncached},
    shape::{
        CollectionShape, IdentityShape, PolymorphicShape, ScalarShape, ShapeNode, StructureShape,
    },
    test_support::{customer_orders_shape, int, text},
    traits::{StaticCatalog, TypeMapping},
    value::{ScalarType, Value},
};
use std::sync::Arc;

fn compile_with(shape: &ShapeNode, ctx: &CompileContext) -> Result<Plan, InternalError> {
    compile_uncached(shape, ctx, ShapeKey::build(shape, ctx))
}

fn compile(shape: &ShapeNode) -> Result<Plan, InternalError> {
    compile_with(shape, &CompileContext::default())
}

fn point() -> StructureShape {
    StructureShape::new("Point").property("x", ScalarShape::new(0, ScalarType::Int32))
}

fn assert_configuration(result: Result<Plan, InternalError>) -> InternalError {
    let err = result.unwrap_err();
    assert_eq!(err.class, ErrorClass::Configuration, "{err}");
    assert_eq!(err.origin, ErrorOrigin::Compile);

    err
}

#[test]
fn root_must_be_a_collection() {
    let err = assert_configuration(compile(&point().into()));
    assert!(err.message.contains("structure"), "{err}");
}

#[test]
fn collection_of_collections_is_rejected() {
    let shape: ShapeNode = CollectionShape::new(CollectionShape::new(point())).into();

    assert_configuration(compile(&shape));
}

#[test]
fn unresolved_variable_reference_is_an_invariant_violation() {
    let shape: ShapeNode = CollectionShape::new(
        StructureShape::new("Order").property("customer", ShapeNode::VarRef("c".to_string())),
    )
    .into();

    let err = compile(&shape).unwrap_err();
    assert_eq!(err.class, ErrorClass::InvariantViolation);
    assert_eq!(err.origin, ErrorOrigin::Shape);
}

#[test]
fn key_columns_need_a_concrete_type() {
    let shape: ShapeNode = CollectionShape::new(point())
        .key(ScalarShape::new(0, ScalarType::Any))
        .into();

    assert_configuration(compile(&shape));
}

#[test]
fn duplicate_property_names_are_rejected() {
    let shape: ShapeNode = CollectionShape::new(
        point().property("x", ScalarShape::new(1, ScalarType::Int32)),
    )
    .into();

    let err = assert_configuration(compile(&shape));
    assert!(err.message.contains("'x'"), "{err}");
}

#[test]
fn closed_catalog_rejects_unmapped_and_abstract_types() {
    let catalog = StaticCatalog::new().with_type("Shape", TypeMapping::abstract_object());
    let ctx = CompileContext::default().with_catalog(Arc::new(catalog));

    let unmapped = assert_configuration(compile_with(&CollectionShape::new(point()).into(), &ctx));
    assert!(unmapped.message.contains("not mapped"), "{unmapped}");

    let shape: ShapeNode = CollectionShape::new(StructureShape::new("Shape")).into();
    assert_configuration(compile_with(&shape, &ctx));
}

#[test]
fn identities_need_keys_and_entity_sets() {
    let keyless: ShapeNode =
        CollectionShape::new(point().identity(IdentityShape::new("Points", vec![]))).into();
    assert_configuration(compile(&keyless));

    let setless: ShapeNode = CollectionShape::new(point().identity(IdentityShape::discriminated(
        ScalarShape::new(1, ScalarType::Int32),
        vec![],
        vec![ScalarShape::new(0, ScalarType::Int32)],
    )))
    .into();
    assert_configuration(compile(&setless));
}

#[test]
fn collection_discriminator_must_match_the_column_type() {
    let shape: ShapeNode = CollectionShape::new(point())
        .discriminator(ScalarShape::new(1, ScalarType::Int32), text("P"))
        .into();
    assert_configuration(compile(&shape));

    let shape: ShapeNode = CollectionShape::new(point())
        .discriminator(ScalarShape::new(1, ScalarType::Int32), Value::Null)
        .into();
    assert_configuration(compile(&shape));
}

#[test]
fn slots_cover_keys_coordinators_and_entity_sets() {
    let vehicle = StructureShape::new("Vehicle")
        .identity(IdentityShape::discriminated(
            ScalarShape::new(1, ScalarType::Int32),
            vec!["Cars".to_string()],
            vec![ScalarShape::new(0, ScalarType::Int32)],
        ))
        .property("id", ScalarShape::new(0, ScalarType::Int32));
    let shape: ShapeNode = CollectionShape::new(vehicle)
        .key(ScalarShape::new(0, ScalarType::Int32))
        .into();

    let plan = compile(&shape).unwrap();
    assert_eq!(plan.node_count(), 1);
    assert_eq!(plan.state_slot_count(), 3);
}

#[test]
fn nested_collections_are_numbered_in_compile_order() {
    let plan = compile(&customer_orders_shape()).unwrap();

    let ids: Vec<_> = plan.nodes().iter().map(|n| n.id().index()).collect();
    assert_eq!(ids, vec![0, 1]);
    assert_eq!(plan.nodes()[1].parent(), Some(plan.root().id()));
    assert!(!plan.root().has_row_filter());
}

#[test]
fn polymorphic_tags_may_not_be_null() {
    let shape: ShapeNode = CollectionShape::new(
        PolymorphicShape::new(ScalarShape::new(1, ScalarType::Text)).choice(Value::Null, point()),
    )
    .into();

    assert_configuration(compile(&shape));
}

#[test]
fn discriminator_tables_pick_a_lookup_strategy() {
    let column = ScalarShape::new(0, ScalarType::Int64);
    let table =
        DiscriminatorTable::build(&column, vec![(Value::Int64(1), 0), (Value::Int64(2), 1)])
            .unwrap();
    assert!(matches!(table, DiscriminatorTable::Integer(_)));
    assert_eq!(table.lookup(&Value::Int16(2)), Some(1));
    assert_eq!(table.lookup(&Value::Null), None);

    let column = ScalarShape::new(0, ScalarType::Text);
    let table = DiscriminatorTable::build(&column, vec![(text("Dog  "), 0)]).unwrap();
    assert!(matches!(table, DiscriminatorTable::Text(_)));
    assert_eq!(table.lookup(&text("Dog")), Some(0));
    assert_eq!(table.lookup(&text("Do")), None);

    let column = ScalarShape::new(0, ScalarType::Bool);
    let table =
        DiscriminatorTable::build(&column, vec![(Value::Bool(true), 0), (Value::Bool(false), 1)])
            .unwrap();
    assert!(matches!(table, DiscriminatorTable::Linear(_)));
    assert_eq!(table.len(), 2);
    assert_eq!(table.lookup(&Value::Bool(false)), Some(1));

    let column = ScalarShape::new(0, ScalarType::Int32);
    assert!(DiscriminatorTable::build(&column, vec![(int(1), 0), (int(1), 1)]).is_err());
}
