use vitrine::{
    config::ShowcaseConfig,
    showcase::{gallery::Gallery, layout::slot_position_x},
};

fn gallery_for(config: &ShowcaseConfig) -> Gallery<String> {
    Gallery::new(config.assets.len(), config.spacing, config.gap_after_first)
}

#[test]
fn default_row_leaves_a_gap_after_the_first_model() {
    let config = ShowcaseConfig::default();
    let xs: Vec<f32> = (0..4)
        .map(|i| slot_position_x(i, config.assets.len(), config.spacing, config.gap_after_first))
        .collect();
    assert_eq!(xs, vec![-20.0, 0.0, 10.0, 20.0]);
}

#[test]
fn every_completion_order_gives_the_same_layout() {
    let config = ShowcaseConfig::default();
    let orders = [[0, 1, 2, 3], [3, 2, 1, 0], [2, 0, 3, 1], [1, 3, 0, 2]];

    let mut layouts: Vec<Vec<(usize, f32)>> = orders
        .iter()
        .map(|order| {
            let mut gallery = gallery_for(&config);
            for &request_index in order {
                gallery.push(request_index, config.assets[request_index].clone());
            }
            let mut layout: Vec<(usize, f32)> = gallery
                .iter()
                .map(|slot| (slot.request_index, slot.position_x))
                .collect();
            layout.sort_by_key(|(index, _)| *index);
            layout
        })
        .collect();

    let first = layouts.remove(0);
    assert!(layouts.iter().all(|layout| *layout == first));
}

#[test]
fn gallery_keeps_completion_order() {
    let config = ShowcaseConfig::default();
    let mut gallery = gallery_for(&config);
    for request_index in [2, 0, 3] {
        gallery.push(request_index, config.assets[request_index].clone());
    }
    let order: Vec<usize> = gallery.iter().map(|slot| slot.request_index).collect();
    assert_eq!(order, vec![2, 0, 3]);
    assert!(gallery.iter().all(|slot| config.assets[slot.request_index] == slot.content));
    assert_eq!(gallery.requested(), 4);
}

#[test]
fn positions_are_distinct_and_increasing() {
    for count in 1..8 {
        let xs: Vec<f32> = (0..count).map(|i| slot_position_x(i, count, 10.0, 1)).collect();
        assert!(xs.windows(2).all(|pair| pair[0] < pair[1]), "{xs:?}");
    }
}
