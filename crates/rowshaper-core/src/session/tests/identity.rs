use super::{materializer, run};
use crate::{
    cursor::VecRowCursor,
    element::{Element, EntityKey, MergeOption},
    shape::{CollectionShape, IdentityShape, ReferenceShape, ScalarShape, ShapeNode, StructureShape},
    test_support::{TrackingResolver, collection_property, int, int_property, row, text},
    value::{ScalarType, Value},
};
use std::sync::Arc;

fn customer_entity_shape() -> ShapeNode {
    let customer = StructureShape::new("Customer")
        .identity(IdentityShape::new(
            "Customers",
            vec![ScalarShape::new(0, ScalarType::Int32)],
        ))
        .property("id", ScalarShape::new(0, ScalarType::Int32))
        .property("name", ScalarShape::new(1, ScalarType::Text).nullable());

    CollectionShape::new(customer)
        .key(ScalarShape::new(0, ScalarType::Int32))
        .into()
}

fn name(element: &Element) -> Option<&str> {
    element.as_object()?.get("name")?.as_value()?.as_text()
}

#[test]
fn reference_yields_the_related_entity_key() {
    let order = StructureShape::new("Order")
        .property("id", ScalarShape::new(0, ScalarType::Int32))
        .property(
            "customer",
            ReferenceShape::new(IdentityShape::new(
                "Customers",
                vec![ScalarShape::new(1, ScalarType::Int32)],
            )),
        );
    let shape: ShapeNode = CollectionShape::new(order).into();

    let orders = run(
        &shape,
        vec![row([int(10), int(1)]), row([int(11), Value::Null])],
    );

    assert_eq!(orders.len(), 2);
    let first = orders[0].as_object().unwrap();
    assert_eq!(
        first.get("customer"),
        Some(&Element::Reference(EntityKey::new("Customers", vec![int(1)])))
    );
    let second = orders[1].as_object().unwrap();
    assert_eq!(second.get("customer"), Some(&Element::Null));
}

#[test]
fn entities_carry_their_key() {
    let customers = run(
        &customer_entity_shape(),
        vec![row([int(1), text("Ann")]), row([int(2), text("Bob")])],
    );

    let keys: Vec<_> = customers
        .iter()
        .map(|c| c.as_object().unwrap().key.clone())
        .collect();
    assert_eq!(
        keys,
        vec![
            Some(EntityKey::new("Customers", vec![int(1)])),
            Some(EntityKey::new("Customers", vec![int(2)])),
        ]
    );
}

#[test]
fn append_only_returns_the_tracked_instance() {
    let resolver = Arc::new(TrackingResolver::default());
    let materializer = materializer().identity_resolver(resolver.clone());
    let shape = customer_entity_shape();

    let first = materializer
        .collect(
            &shape,
            VecRowCursor::from_rows(vec![row([int(1), text("Ann")])]),
        )
        .unwrap();
    let second = materializer
        .collect(
            &shape,
            VecRowCursor::from_rows(vec![
                row([int(1), text("Changed")]),
                row([int(2), text("Bob")]),
            ]),
        )
        .unwrap();

    assert_eq!(name(&first[0]), Some("Ann"));
    assert_eq!(name(&second[0]), Some("Ann"));
    assert_eq!(name(&second[1]), Some("Bob"));
    assert_eq!(resolver.calls(), 3);
    assert_eq!(
        resolver.tracked_keys(),
        vec!["Customers(Int32(1))", "Customers(Int32(2))"]
    );
}

#[test]
fn merge_option_reaches_the_resolver() {
    let resolver = Arc::new(TrackingResolver::default());
    let shape = customer_entity_shape();

    let overwrite = materializer()
        .identity_resolver(resolver.clone())
        .merge_option(MergeOption::OverwriteChanges);
    overwrite
        .collect(
            &shape,
            VecRowCursor::from_rows(vec![row([int(1), text("Ann")])]),
        )
        .unwrap();
    let updated = overwrite
        .collect(
            &shape,
            VecRowCursor::from_rows(vec![row([int(1), text("Changed")])]),
        )
        .unwrap();
    assert_eq!(name(&updated[0]), Some("Changed"));

    let untracked = Arc::new(TrackingResolver::default());
    let detached = materializer()
        .identity_resolver(untracked.clone())
        .merge_option(MergeOption::NoTracking)
        .collect(
            &shape,
            VecRowCursor::from_rows(vec![row([int(3), text("Cy")])]),
        )
        .unwrap();
    assert_eq!(name(&detached[0]), Some("Cy"));
    assert_eq!(untracked.calls(), 1);
    assert!(untracked.tracked_keys().is_empty());
}

#[test]
fn discriminated_entity_set_is_chosen_per_row() {
    let vehicle = StructureShape::new("Vehicle")
        .identity(IdentityShape::discriminated(
            ScalarShape::new(1, ScalarType::Int32),
            vec!["Cars".to_string(), "Boats".to_string()],
            vec![ScalarShape::new(0, ScalarType::Int32)],
        ))
        .property("id", ScalarShape::new(0, ScalarType::Int32));
    let shape: ShapeNode = CollectionShape::new(vehicle)
        .key(ScalarShape::new(0, ScalarType::Int32))
        .into();

    let vehicles = run(
        &shape,
        vec![
            row([int(1), int(0)]),
            row([int(2), int(1)]),
            row([int(3), int(7)]),
        ],
    );

    let keys: Vec<_> = vehicles
        .iter()
        .map(|v| v.as_object().unwrap().key.clone())
        .collect();
    assert_eq!(
        keys,
        vec![
            Some(EntityKey::new("Cars", vec![int(1)])),
            Some(EntityKey::new("Boats", vec![int(2)])),
            None,
        ]
    );
}

#[test]
fn null_first_key_is_left_out_of_the_collection() {
    let order = StructureShape::new("Order")
        .identity(IdentityShape::new(
            "Orders",
            vec![ScalarShape::new(2, ScalarType::Int32)],
        ))
        .property("id", ScalarShape::new(1, ScalarType::Int32))
        .property("code", ScalarShape::new(2, ScalarType::Int32).nullable());
    let customer = StructureShape::new("Customer")
        .property("id", ScalarShape::new(0, ScalarType::Int32))
        .property(
            "orders",
            CollectionShape::new(order).key(ScalarShape::new(1, ScalarType::Int32)),
        );
    let shape: ShapeNode = CollectionShape::new(customer)
        .key(ScalarShape::new(0, ScalarType::Int32))
        .into();

    let customers = run(
        &shape,
        vec![
            row([int(1), int(10), int(100)]),
            row([int(1), int(11), Value::Null]),
            row([int(1), int(12), int(102)]),
        ],
    );

    assert_eq!(customers.len(), 1);
    let orders = collection_property(&customers[0], "orders");
    let ids: Vec<_> = orders.iter().filter_map(|o| int_property(o, "id")).collect();
    assert_eq!(ids, vec![10, 12]);
}
