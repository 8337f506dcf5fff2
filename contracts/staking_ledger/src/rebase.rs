use crate::storage::Epoch;
use protocol_common::Error;

/// Number of epoch boundaries crossed at `now`.
///
/// Formula: due = (now - end_time) / length + 1, or 0 while now < end_time
///
/// Example:
/// - end_time: 1020, length: 20
/// - now 1019 -> 0, now 1020 -> 1, now 1305 -> 15
pub fn epochs_due(epoch: &Epoch, now: u64) -> u64 {
    if now < epoch.end_time || epoch.length == 0 {
        return 0;
    }
    (now - epoch.end_time) / epoch.length + 1
}

/// Roll the epoch forward by `epochs` and grow the index linearly.
///
/// Formula: index' = index + rebase_per_epoch × epochs
///          end_time' = end_time + length × epochs
pub fn advance(
    epoch: &Epoch,
    index: i128,
    rebase_per_epoch: i128,
    epochs: u64,
) -> Result<(Epoch, i128), Error> {
    let span = epoch
        .length
        .checked_mul(epochs)
        .ok_or(Error::ArithmeticOverflow)?;

    let next = Epoch {
        length: epoch.length,
        number: epoch
            .number
            .checked_add(epochs)
            .ok_or(Error::ArithmeticOverflow)?,
        end_time: epoch
            .end_time
            .checked_add(span)
            .ok_or(Error::ArithmeticOverflow)?,
        unit: epoch.unit,
    };

    let growth = rebase_per_epoch
        .checked_mul(epochs as i128)
        .ok_or(Error::ArithmeticOverflow)?;
    let next_index = index
        .checked_add(growth)
        .ok_or(Error::ArithmeticOverflow)?;

    Ok((next, next_index))
}
