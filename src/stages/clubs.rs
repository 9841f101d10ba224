use super::{text, StageReport};
use crate::ids::{ClubId, ClubMap};
use crate::loader::{insert_in_chunks, BulkInsert, SqlRow};
use crate::tables;

pub fn club_rows(names: &[String]) -> Vec<SqlRow> {
    names.iter().map(|n| vec![text(n)]).collect()
}

pub fn load_clubs<S>(sink: &mut S, names: &[String], chunk_size: usize) -> (ClubMap, StageReport)
where
    S: BulkInsert + ?Sized,
{
    let rows = club_rows(names);
    let outcome = insert_in_chunks(sink, &tables::CLUBS, &rows, chunk_size);

    let mut clubs = ClubMap::new();
    for r in outcome.rows() {
        if let (Some(id), Some(name)) = (r.id(), r.text("name")) {
            clubs.insert(name.to_string(), ClubId(id));
        }
    }

    let report = StageReport::new("clubs", &tables::CLUBS, rows.len(), 0, &outcome);
    (clubs, report)
}
