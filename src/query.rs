//!
//! The Query module contains the select, update and delete queries, which combine a [Filter] with
//! the primitive operations of any [RecordStore].
//!

use tracing::debug;

use crate::error::StoreError;
use crate::filter::Filter;
use crate::records::{RecordArgs, RecordID};
use crate::selection::{Selection, Setters, Projection};
use crate::store::RecordStore;
use crate::validation::ValidationConfig;

/// Returns the selected properties of every record the filter accepts, or of every record if
/// there is no filter
pub fn select<S : RecordStore + ?Sized>(store : &mut S, selection : &Selection, filter : Option<&Filter>) -> Result<Vec<Projection>, StoreError> {
    let records = store.get_records(filter)?;
    Ok(records.iter().map(|record| selection.project(record)).collect())
}

/// Applies the setters to every record the filter accepts, and returns the ids of the records
/// that were edited
///
/// Every rewritten record is validated against `V` before the first one is edited, so either all
/// the matching records are updated or none are.
pub fn update<V : ValidationConfig, S : RecordStore + ?Sized>(store : &mut S, setters : &Setters, filter : &Filter) -> Result<Vec<RecordID>, StoreError> {

    let records = store.get_records(Some(filter))?;

    let mut rewritten = Vec::with_capacity(records.len());
    for record in records.iter() {
        let mut args = RecordArgs::from(record);
        setters.apply_to(&mut args);
        V::validate(&args)?;
        rewritten.push(args);
    }

    let mut ids = Vec::with_capacity(rewritten.len());
    for args in rewritten.iter() {
        store.edit(args)?;
        ids.push(args.id);
    }

    debug!("update '{}' edited {} records", filter.text(), ids.len());
    Ok(ids)
}

/// Removes every record the filter accepts, and returns their ids
pub fn delete<S : RecordStore + ?Sized>(store : &mut S, filter : &Filter) -> Result<Vec<RecordID>, StoreError> {

    let ids : Vec<RecordID> = store.get_records(Some(filter))?.iter().map(|record| record.id).collect();
    for id in ids.iter() {
        store.remove(*id)?;
    }

    debug!("delete '{}' removed {} records", filter.text(), ids.len());
    Ok(ids)
}
