// Formato de fechas de los registros INODE: "MM/DD/YY HH:MM:SS" en UTC.

const SECS_PER_DAY: i64 = 86_400;

/// Convierte días desde 1970-01-01 a (año, mes, día) del calendario civil.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097); // [0, 146096]
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365; // [0, 399]
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100); // [0, 365]
    let mp = (5 * doy + 2) / 153; // [0, 11], marzo = 0
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

/// Segundos desde la época (UTC) a "MM/DD/YY HH:MM:SS".
pub fn format_timestamp(secs: u32) -> String {
    let secs = i64::from(secs);
    let days = secs.div_euclid(SECS_PER_DAY);
    let rem = secs.rem_euclid(SECS_PER_DAY);

    let (year, month, day) = civil_from_days(days);
    let hour = rem / 3_600;
    let minute = (rem % 3_600) / 60;
    let second = rem % 60;

    format!(
        "{:02}/{:02}/{:02} {:02}:{:02}:{:02}",
        month,
        day,
        year.rem_euclid(100),
        hour,
        minute,
        second
    )
}
