use super::{text, StageReport};
use crate::ids::{CompetitionId, CompetitionMap};
use crate::loader::{insert_in_chunks, BulkInsert};
use crate::tables;

pub fn load_competitions<S>(
    sink: &mut S,
    names: &[String],
    chunk_size: usize,
) -> (CompetitionMap, StageReport)
where
    S: BulkInsert + ?Sized,
{
    let rows: Vec<_> = names.iter().map(|n| vec![text(n)]).collect();
    let outcome = insert_in_chunks(sink, &tables::COMPETITIONS, &rows, chunk_size);

    let mut competitions = CompetitionMap::new();
    for r in outcome.rows() {
        if let (Some(id), Some(name)) = (r.id(), r.text("name")) {
            competitions.insert(name.to_string(), CompetitionId(id));
        }
    }

    let report = StageReport::new(
        "competitions",
        &tables::COMPETITIONS,
        rows.len(),
        0,
        &outcome,
    );
    (competitions, report)
}
