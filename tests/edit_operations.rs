use std::cell::Cell;
use std::rc::Rc;

use cmap::prelude::*;
use proptest::prelude::*;

fn counter() -> (Rc<Cell<usize>>, impl Fn(&mut u32, &mut u32) + 'static) {
    let count = Rc::new(Cell::new(0));
    let hook_count = Rc::clone(&count);
    let hook = move |_: &mut u32, _: &mut u32| hook_count.set(hook_count.get() + 1);
    (count, hook)
}

#[test]
fn sew_merges_and_unsew_splits_edge_attributes() {
    let mut map = CombinatorialMap::new(2);
    map.enable_attributes_with::<u32>(1, AttributeConfig::auto_create())
        .unwrap();
    let (merges, on_merge) = counter();
    let (splits, on_split) = counter();
    map.set_onmerge_function::<u32, _>(1, on_merge).unwrap();
    map.set_onsplit_function::<u32, _>(1, on_split).unwrap();

    let a = map.make_combinatorial_polygon(3).unwrap();
    let b = map.make_combinatorial_polygon(3).unwrap();
    assert_eq!(map.number_of_attributes(1).unwrap(), 6);

    map.sew(2, a, b).unwrap();
    assert_eq!(merges.get(), 1);
    assert_eq!(splits.get(), 0);
    assert_eq!(map.number_of_attributes(1).unwrap(), 5);
    assert_eq!(map.attribute(1, a).unwrap(), map.attribute(1, b).unwrap());
    assert!(map.is_valid());

    map.unsew(2, a).unwrap();
    assert_eq!(merges.get(), 1);
    assert_eq!(splits.get(), 1);
    let ha = map.attribute(1, a).unwrap();
    let hb = map.attribute(1, b).unwrap();
    assert!(ha.is_some() && hb.is_some());
    assert_ne!(ha, hb);
    assert_eq!(map.number_of_attributes(1).unwrap(), 6);
    assert!(map.is_valid());
}

#[test]
fn sew_and_unsew_are_inverse_without_attributes() {
    let mut map = CombinatorialMap::new(3);
    let a = map.make_combinatorial_hexahedron().unwrap();
    let b = map.make_combinatorial_hexahedron().unwrap();
    let before = map.characteristics().unwrap();
    assert_eq!(before.components, 2);

    assert!(map.is_sewable(3, a, b).unwrap());
    map.sew(3, a, b).unwrap();
    assert_eq!(map.characteristics().unwrap().components, 1);
    assert_eq!(map.darts_of_orbit(a, &[3]).unwrap().count(), 2);
    assert!(map.is_valid());

    map.unsew(3, a).unwrap();
    assert_eq!(map.characteristics().unwrap(), before);
    assert!(map.darts().all(|d| map.is_free(d, 3)));
}

#[test]
fn topological_sew_leaves_attributes_alone() {
    let mut map = CombinatorialMap::new(2);
    map.enable_attributes_with::<u32>(1, AttributeConfig::auto_create())
        .unwrap();
    let a = map.make_combinatorial_polygon(4).unwrap();
    let b = map.make_combinatorial_polygon(4).unwrap();
    let (merges, on_merge) = counter();
    map.set_onmerge_function::<u32, _>(1, on_merge).unwrap();

    map.topo_sew(2, a, b).unwrap();
    assert_eq!(merges.get(), 0);
    assert_eq!(map.number_of_attributes(1).unwrap(), 8);
    assert!(map.are_attributes_automatically_managed());
    assert!(map.validate_with(MapValidationOptions::topology_only()).is_ok());
    assert!(!map.is_valid());

    let report = map.correct_invalid_attributes().unwrap();
    assert_eq!(report.erased, 1);
    assert_eq!(merges.get(), 0);
    assert_eq!(map.number_of_attributes(1).unwrap(), 7);
    assert!(map.is_valid());
}

#[test]
fn repair_after_unmanaged_edits() {
    let mut map = CombinatorialMap::new(3);
    map.enable_attributes::<u32>(0).unwrap();
    map.set_automatic_attributes_management(false);
    let d = map.make_combinatorial_hexahedron().unwrap();
    assert_eq!(map.number_of_attributes(0).unwrap(), 0);

    // One attribute on two darts of different vertices: the vertex cells
    // are both mixed and the attribute is shared.
    let h = map.create_attribute::<u32>(0, 7).unwrap();
    let other = map.beta(d, 1).unwrap();
    map.set_attribute(0, d, Some(h)).unwrap();
    map.set_attribute(0, other, Some(h)).unwrap();
    assert!(!map.is_valid());

    let report = map.correct_invalid_attributes().unwrap();
    assert!(!report.is_clean());
    assert!(map.is_valid());
    assert_eq!(map.number_of_attributes(0).unwrap(), 2);
    assert_eq!(*map.info::<u32>(0, d).unwrap(), 7);
    assert_eq!(*map.info::<u32>(0, other).unwrap(), 7);
    assert_ne!(map.attribute(0, d).unwrap(), map.attribute(0, other).unwrap());

    map.set_automatic_attributes_management(true);
    assert!(map.correct_invalid_attributes().unwrap().is_clean());
}

#[test]
fn repair_report_serializes() {
    let report = RepairReport {
        reassigned: 3,
        duplicated: 1,
        created: 0,
        erased: 2,
    };
    let json = serde_json::to_value(report).unwrap();
    assert_eq!(json["duplicated"], 1);
    let back: RepairReport = serde_json::from_value(json).unwrap();
    assert_eq!(back, report);
}

#[test]
fn triangulating_a_face_then_removing_the_centre() {
    let mut map = CombinatorialMap::new(3);
    map.enable_attributes_with::<u32>(0, AttributeConfig::auto_create())
        .unwrap();
    map.enable_attributes_with::<u32>(2, AttributeConfig::auto_create())
        .unwrap();
    let d = map.make_combinatorial_hexahedron().unwrap();
    let (merges, on_merge) = counter();
    let (splits, on_split) = counter();
    map.set_onmerge_function::<u32, _>(2, on_merge).unwrap();
    map.set_onsplit_function::<u32, _>(2, on_split).unwrap();

    let centre = map.insert_cell_0_in_cell_2(d).unwrap();
    assert_eq!(map.count_all_cells().unwrap(), vec![9, 16, 9, 1, 1]);
    assert_eq!(map.number_of_attributes(0).unwrap(), 9);
    assert_eq!(map.number_of_attributes(2).unwrap(), 9);
    assert_eq!(splits.get(), 3);
    assert!(map.is_valid());

    assert!(!map.is_removable(0, centre).unwrap());
    assert!(matches!(
        map.remove_cell(0, centre),
        Err(MapError::PreconditionViolation { .. })
    ));

    // Removing three spokes brings the centre down to degree one, the last
    // spoke is then a dangling edge.
    let spokes = map.one_dart_per_incident_cell(centre, 1, 0).unwrap();
    assert_eq!(spokes.len(), 4);
    for &spoke in &spokes[..3] {
        map.remove_cell(1, spoke).unwrap();
        assert!(map.is_valid());
    }
    assert_eq!(merges.get(), 3);
    map.remove_cell(1, spokes[3]).unwrap();
    assert_eq!(map.count_all_cells().unwrap(), vec![8, 12, 6, 1, 1]);
    assert_eq!(map.number_of_attributes(0).unwrap(), 8);
    assert_eq!(map.number_of_attributes(2).unwrap(), 6);
    assert!(map.is_valid());
}

#[test]
fn failed_preconditions_leave_the_map_untouched() {
    let mut map = CombinatorialMap::new(2);
    let a = map.make_combinatorial_tetrahedron().unwrap();
    let next = map.beta(a, 1).unwrap();
    let opposite = map.beta(a, 2).unwrap();
    let before = map.characteristics().unwrap();

    assert!(matches!(
        map.sew(2, a, next),
        Err(MapError::PreconditionViolation { .. })
    ));
    assert!(matches!(
        map.insert_cell_1_in_cell_2(a, opposite),
        Err(MapError::PreconditionViolation { .. })
    ));
    assert!(matches!(
        map.insert_cell_2_in_cell_3(&[a]),
        Err(MapError::DimensionTooLow { .. })
    ));
    assert!(matches!(
        map.remove_cell(0, a),
        Err(MapError::PreconditionViolation { .. })
    ));
    assert_eq!(map.characteristics().unwrap(), before);

    let lone = map.create_dart();
    assert!(matches!(
        map.unsew(2, lone),
        Err(MapError::PreconditionViolation { .. })
    ));
    map.erase_dart(lone).unwrap();
    assert!(matches!(map.unsew(2, lone), Err(MapError::UnknownDart(_))));
    assert_eq!(map.characteristics().unwrap(), before);
}

#[test]
fn unsew_splits_both_endpoints_of_the_edge() {
    let mut map = CombinatorialMap::new(2);
    map.enable_attributes_with::<u32>(0, AttributeConfig::auto_create())
        .unwrap();
    let a = map.make_combinatorial_polygon(3).unwrap();
    let b = map.make_combinatorial_polygon(3).unwrap();
    map.sew(2, a, b).unwrap();
    assert_eq!(map.number_of_cells(0).unwrap(), 4);
    assert_eq!(map.number_of_attributes(0).unwrap(), 4);

    let (splits, on_split) = counter();
    map.set_onsplit_function::<u32, _>(0, on_split).unwrap();
    map.unsew(2, a).unwrap();
    assert_eq!(splits.get(), 2);
    assert_eq!(map.number_of_cells(0).unwrap(), 6);
    assert_eq!(map.number_of_attributes(0).unwrap(), 6);
    assert!(map.is_valid());
}

#[test]
fn edge_insertion_splits_the_face_attribute() {
    let mut map = CombinatorialMap::new(2);
    map.enable_attributes_with::<u32>(2, AttributeConfig::auto_create())
        .unwrap();
    let d1 = map.make_combinatorial_polygon(4).unwrap();
    let (splits, on_split) = counter();
    map.set_onsplit_function::<u32, _>(2, on_split).unwrap();

    let d2 = map.beta_path(d1, &[1, 1]).unwrap();
    let n = map.insert_cell_1_in_cell_2(d1, d2).unwrap();
    assert_eq!(splits.get(), 1);
    assert_eq!(map.number_of_attributes(2).unwrap(), 2);
    let opposite = map.beta(n, 2).unwrap();
    assert_ne!(
        map.attribute(2, n).unwrap(),
        map.attribute(2, opposite).unwrap()
    );
    assert!(map.is_valid());
}

#[test]
fn face_insertion_splits_the_volume_attribute() {
    let mut map = CombinatorialMap::new(3);
    map.enable_attributes_with::<u32>(3, AttributeConfig::auto_create())
        .unwrap();
    let d = map.make_combinatorial_hexahedron().unwrap();
    let (splits, on_split) = counter();
    map.set_onsplit_function::<u32, _>(3, on_split).unwrap();

    let path = [
        d,
        map.beta(d, 1).unwrap(),
        map.beta_path(d, &[1, 1]).unwrap(),
        map.beta(d, 0).unwrap(),
    ];
    map.insert_cell_2_in_cell_3(&path).unwrap();
    assert_eq!(splits.get(), 1);
    assert_eq!(map.number_of_cells(3).unwrap(), 2);
    assert_eq!(map.number_of_attributes(3).unwrap(), 2);
    assert!(map.is_valid());
}

#[test]
fn removing_a_face_splits_the_shared_vertex() {
    let mut map = CombinatorialMap::new(2);
    map.enable_attributes_with::<u32>(0, AttributeConfig::auto_create())
        .unwrap();
    // a strip of three triangles, the middle one shares a vertex with both
    let x0 = map.make_combinatorial_polygon(3).unwrap();
    let x2 = map.beta(x0, 0).unwrap();
    let y = map.make_combinatorial_polygon(3).unwrap();
    let z = map.make_combinatorial_polygon(3).unwrap();
    map.sew(2, x0, y).unwrap();
    map.sew(2, x2, z).unwrap();
    assert_eq!(map.number_of_cells(0).unwrap(), 5);
    assert_eq!(map.number_of_attributes(0).unwrap(), 5);

    let (splits, on_split) = counter();
    map.set_onsplit_function::<u32, _>(0, on_split).unwrap();
    assert!(map.is_removable(2, x0).unwrap());
    map.remove_cell(2, x0).unwrap();
    assert_eq!(splits.get(), 1);
    assert_eq!(map.number_of_darts(), 6);
    assert_eq!(map.number_of_cells(0).unwrap(), 6);
    assert_eq!(map.number_of_attributes(0).unwrap(), 6);
    assert!(!map.belong_to_same_cell(y, z, 0).unwrap());
    assert!(map.is_valid());
}

/// Two separate hexahedra carrying an attribute on every cell dimension.
fn attributed_hexahedra() -> CombinatorialMap {
    let mut map = CombinatorialMap::new(3);
    for dim in 0..=3 {
        map.enable_attributes_with::<u32>(dim, AttributeConfig::auto_create())
            .unwrap();
    }
    map.make_combinatorial_hexahedron().unwrap();
    map.make_combinatorial_hexahedron().unwrap();
    map
}

fn apply_edit(map: &mut CombinatorialMap, d: DartHandle, op: usize) {
    // failed preconditions are expected here and leave the map untouched
    let _ = match op {
        0 => map.unsew(2, d),
        1 => map.unsew(3, d),
        2 | 3 => {
            let i = op;
            let partner = map
                .darts()
                .find(|&e| map.is_sewable(i, d, e).unwrap_or(false));
            match partner {
                Some(e) => map.sew(i, d, e),
                None => Ok(()),
            }
        }
        4 => map.insert_cell_0_in_cell_1(d).map(|_| ()),
        5 => map.insert_cell_0_in_cell_2(d).map(|_| ()),
        6 => match map.beta_path(d, &[1, 1]) {
            Some(d2) => map.insert_cell_1_in_cell_2(d, d2).map(|_| ()),
            None => Ok(()),
        },
        _ => {
            let i = op - 7;
            if map.is_removable(i, d).unwrap_or(false) {
                map.remove_cell(i, d).map(|_| ())
            } else {
                Ok(())
            }
        }
    };
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_edits_keep_attributes_consistent(
        edits in prop::collection::vec((0usize..1000, 0usize..9), 1..24)
    ) {
        let mut map = attributed_hexahedra();
        prop_assert!(map.is_valid());
        for (pick, op) in edits {
            let n = map.number_of_darts();
            if n == 0 {
                break;
            }
            let Some(d) = map.darts().nth(pick % n) else { continue };
            apply_edit(&mut map, d, op);
            prop_assert!(map.is_valid(), "invalid after op {} on {:?}", op, d);
        }
        prop_assert_eq!(map.number_of_used_marks(), 0);
    }
}
