use types::{Instance, KeptRoom, MergedSource, Overall, PartitionDetail, PartitionKey, RemovedRoom};

/// Folds one partition's solved assignment into a [`PartitionDetail`] (C5).
pub fn assemble_partition(
    key: &PartitionKey,
    inst: &Instance,
    assign: &[usize],
) -> PartitionDetail {
    let n = inst.len();

    let mut kept_rooms: Vec<usize> = (0..n).filter(|&j| assign.iter().any(|&a| a == j)).collect();
    kept_rooms.sort_unstable();

    let mut removed_rooms: Vec<usize> = (0..n).filter(|&i| assign[i] != i).collect();
    removed_rooms.sort_unstable();

    let kept_rooms_data: Vec<KeptRoom> = kept_rooms
        .iter()
        .map(|&j| {
            let hosted: Vec<usize> = (0..n).filter(|&i| assign[i] == j).collect();
            let students: i64 = hosted.iter().map(|&i| inst.students[i]).sum();
            let merged_sources = hosted
                .iter()
                .filter(|&&i| i != j)
                .map(|&i| MergedSource {
                    name: inst.name[i].clone(),
                    subject: inst.subject[i].clone(),
                    students: inst.students[i],
                })
                .collect();
            KeptRoom {
                name: inst.name[j].clone(),
                subject: inst.subject[j].clone(),
                students,
                capacity: inst.capacity[j],
                merged_sources,
            }
        })
        .collect();

    let removed_rooms_data: Vec<RemovedRoom> = removed_rooms
        .iter()
        .map(|&i| RemovedRoom {
            name: inst.name[i].clone(),
            subject: inst.subject[i].clone(),
            students: inst.students[i],
            capacity: inst.capacity[i],
            merged_to: inst.name[assign[i]].clone(),
        })
        .collect();

    let initial = n as u32;
    let r#final = kept_rooms.len() as u32;
    PartitionDetail {
        slot: key.slot_key.clone(),
        campus: key.campus.clone(),
        initial,
        r#final,
        saved: initial - r#final,
        kept_rooms_data,
        removed_rooms_data,
    }
}

/// Reduces per-partition details into the global summary (end of C5).
pub fn overall_from_details(details: &[PartitionDetail]) -> Overall {
    let initial_rooms: u32 = details.iter().map(|d| d.initial).sum();
    let final_rooms: u32 = details.iter().map(|d| d.r#final).sum();
    let rooms_saved = initial_rooms - final_rooms;
    let efficiency_percent = if initial_rooms == 0 {
        0.0
    } else {
        let percent = 100.0 * rooms_saved as f64 / initial_rooms as f64;
        (percent * 100.0).round() / 100.0
    };
    Overall {
        initial_rooms,
        final_rooms,
        rooms_saved,
        efficiency_percent,
    }
}
