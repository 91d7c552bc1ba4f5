use bigdecimal::{BigDecimal, Zero};

use crate::db::Row;
use crate::models::{OrderRecord, WeekWindow, WeeklyStats, DATE_FORMAT};

/// Weekly statistics over the records that fall inside `window`.
///
/// Restaurant and person keys are compared as exact strings; maps keep the
/// order in which keys were first seen.
pub fn aggregate(records: &[OrderRecord], window: &WeekWindow) -> WeeklyStats {
    let mut stats = WeeklyStats::default();

    for record in records.iter().filter(|r| window.contains(r.date)) {
        stats.total_orders += 1;
        stats.total_amount += &record.price;

        *stats
            .orders_by_restaurant
            .entry(record.restaurant.clone())
            .or_insert(0) += 1;
        *stats
            .orders_by_person
            .entry(record.person.clone())
            .or_insert(0) += 1;

        let daily = stats
            .daily_totals
            .entry(record.date.format(DATE_FORMAT).to_string())
            .or_insert_with(BigDecimal::zero);
        *daily = &*daily + &record.price;
    }

    stats.average_order_price = if stats.total_orders > 0 {
        &stats.total_amount / &BigDecimal::from(stats.total_orders as u64)
    } else {
        BigDecimal::zero()
    };

    stats
}

fn money(amount: &BigDecimal) -> String {
    format!("${}", amount.round(2).with_scale(2))
}

fn cells(values: &[&str]) -> Row {
    values.iter().map(|v| v.to_string()).collect()
}

/// Flat report layout: title, summary block, then the three key/value tables
pub fn render_report(stats: &WeeklyStats, window: &WeekWindow) -> Vec<Row> {
    let mut rows: Vec<Row> = vec![
        cells(&["Weekly Report", &window.label()]),
        Row::new(),
        cells(&["Summary"]),
        cells(&["Total Orders", &stats.total_orders.to_string()]),
        cells(&["Total Amount", &money(&stats.total_amount)]),
        cells(&["Average Order Price", &money(&stats.average_order_price)]),
        Row::new(),
        cells(&["Orders by Restaurant"]),
        cells(&["Restaurant", "Number of Orders"]),
    ];
    rows.extend(
        stats
            .orders_by_restaurant
            .iter()
            .map(|(restaurant, count)| vec![restaurant.clone(), count.to_string()]),
    );

    rows.push(Row::new());
    rows.push(cells(&["Orders by Person"]));
    rows.push(cells(&["Person", "Number of Orders"]));
    rows.extend(
        stats
            .orders_by_person
            .iter()
            .map(|(person, count)| vec![person.clone(), count.to_string()]),
    );

    rows.push(Row::new());
    rows.push(cells(&["Daily Totals"]));
    rows.push(cells(&["Date", "Total Amount"]));
    rows.extend(
        stats
            .daily_totals
            .iter()
            .map(|(date, amount)| vec![date.clone(), money(amount)]),
    );

    rows
}
