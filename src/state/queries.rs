// Component CRUD and query statements
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row, TransactionBehavior};

use super::db::{StoreError, StoreResult};
use super::models::{format_date, Component, DATE_FORMAT};

const SELECT_COMPONENTS: &str =
    "SELECT id, name, category, quantity, location, acquired_on FROM components";

fn row_to_component(row: &Row) -> rusqlite::Result<Component> {
    let acquired_on: String = row.get(5)?;
    let acquired_on = NaiveDate::parse_from_str(&acquired_on, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

    Ok(Component {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        quantity: row.get(3)?,
        location: row.get(4)?,
        acquired_on,
    })
}

fn collect_components(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> StoreResult<Vec<Component>> {
    let mut stmt = conn.prepare(sql)?;
    let components = stmt
        .query_map(params, row_to_component)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(components)
}

// ==================== MUTATIONS ====================

/// Insert a component; the incoming id is ignored
pub fn insert_component(conn: &Connection, component: &Component) -> StoreResult<i64> {
    conn.execute(
        "INSERT INTO components (name, category, quantity, location, acquired_on)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            component.name,
            component.category,
            component.quantity,
            component.location,
            format_date(&component.acquired_on),
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

/// Full-row replace by id
pub fn update_component(conn: &Connection, component: &Component) -> StoreResult<bool> {
    let rows = conn.execute(
        "UPDATE components
         SET name = ?1, category = ?2, quantity = ?3, location = ?4, acquired_on = ?5
         WHERE id = ?6",
        params![
            component.name,
            component.category,
            component.quantity,
            component.location,
            format_date(&component.acquired_on),
            component.id,
        ],
    )?;
    Ok(rows > 0)
}

pub fn delete_component(conn: &Connection, id: i64) -> StoreResult<bool> {
    let rows = conn.execute("DELETE FROM components WHERE id = ?1", params![id])?;
    Ok(rows > 0)
}

/// Read-then-write quantity change inside one immediate transaction
pub fn adjust_quantity(conn: &mut Connection, id: i64, delta: i64) -> StoreResult<Option<i64>> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let current: i64 = match tx.query_row(
        "SELECT quantity FROM components WHERE id = ?1",
        params![id],
        |row| row.get(0),
    ) {
        Ok(quantity) => quantity,
        Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let quantity = match current.checked_add(delta) {
        Some(q) if q >= 0 => q,
        None if delta > 0 => {
            return Err(StoreError::QuantityOverflow { id, current, delta });
        }
        _ => return Err(StoreError::NegativeQuantity { id, current, delta }),
    };

    tx.execute(
        "UPDATE components SET quantity = ?1 WHERE id = ?2",
        params![quantity, id],
    )?;
    tx.commit()?;

    Ok(Some(quantity))
}

// ==================== READS ====================

pub fn get_component(conn: &Connection, id: i64) -> StoreResult<Option<Component>> {
    let mut stmt = conn.prepare(&format!("{} WHERE id = ?1", SELECT_COMPONENTS))?;

    match stmt.query_row(params![id], row_to_component) {
        Ok(component) => Ok(Some(component)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// All components by name (BINARY collation), ties broken by id
pub fn list_components(conn: &Connection) -> StoreResult<Vec<Component>> {
    collect_components(
        conn,
        &format!("{} ORDER BY name, id", SELECT_COMPONENTS),
        [],
    )
}

/// Substring search over name, category and location.
///
/// `LIKE` folds ASCII case only. Wildcards in `text` are matched literally.
pub fn search_components(conn: &Connection, text: &str) -> StoreResult<Vec<Component>> {
    if text.is_empty() {
        return list_components(conn);
    }

    collect_components(
        conn,
        &format!(
            "{} WHERE name LIKE ?1 ESCAPE '\\'
                OR category LIKE ?1 ESCAPE '\\'
                OR location LIKE ?1 ESCAPE '\\'
             ORDER BY name, id",
            SELECT_COMPONENTS
        ),
        params![like_pattern(text)],
    )
}

/// Components with `quantity <= threshold`, lowest quantity first
pub fn list_low_stock(conn: &Connection, threshold: i64) -> StoreResult<Vec<Component>> {
    collect_components(
        conn,
        &format!(
            "{} WHERE quantity <= ?1 ORDER BY quantity, name, id",
            SELECT_COMPONENTS
        ),
        params![threshold],
    )
}

fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::db::create_schema;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_schema(&conn).unwrap();
        conn
    }

    fn insert(conn: &Connection, name: &str, category: &str, quantity: i64, location: &str) -> i64 {
        let component = Component::new(
            -1,
            name,
            category,
            quantity,
            location,
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        );
        insert_component(conn, &component).unwrap()
    }

    fn names(components: &[Component]) -> Vec<&str> {
        components.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_insert_then_get_preserves_fields() {
        let conn = setup();
        let original = Component::new(
            -1,
            "Resistor 10k",
            "Passive",
            3,
            "Shelf A1",
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        );

        let id = insert_component(&conn, &original).unwrap();
        let stored = get_component(&conn, id).unwrap().unwrap();

        assert_eq!(stored, Component { id, ..original });
    }

    #[test]
    fn test_get_missing_component() {
        let conn = setup();
        assert_eq!(get_component(&conn, 1).unwrap(), None);
    }

    #[test]
    fn test_list_orders_by_name_bytewise() {
        let conn = setup();
        insert(&conn, "capacitor", "Passive", 1, "A");
        insert(&conn, "Zener", "Diode", 1, "B");
        insert(&conn, "LED", "Opto", 1, "C");

        let all = list_components(&conn).unwrap();

        assert_eq!(names(&all), vec!["LED", "Zener", "capacitor"]);
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let conn = setup();
        insert(&conn, "ESP32 DevKit", "Microcontroller", 4, "Bin 2");
        insert(&conn, "Resistor 10k", "Passive", 50, "Shelf A1");
        insert(&conn, "Ceramic cap", "passive", 20, "Drawer");
        insert(&conn, "Buzzer", "Audio", 7, "shelf B");

        assert_eq!(
            names(&search_components(&conn, "PASSIVE").unwrap()),
            vec!["Ceramic cap", "Resistor 10k"]
        );
        assert_eq!(
            names(&search_components(&conn, "shelf").unwrap()),
            vec!["Buzzer", "Resistor 10k"]
        );
        assert_eq!(names(&search_components(&conn, "esp").unwrap()), vec!["ESP32 DevKit"]);
        assert!(search_components(&conn, "nothing").unwrap().is_empty());
    }

    #[test]
    fn test_empty_search_matches_everything() {
        let conn = setup();
        insert(&conn, "B", "x", 1, "y");
        insert(&conn, "A", "x", 2, "y");

        assert_eq!(
            search_components(&conn, "").unwrap(),
            list_components(&conn).unwrap()
        );
    }

    #[test]
    fn test_search_treats_wildcards_literally() {
        let conn = setup();
        insert(&conn, "Pot 100%", "Passive", 1, "A");
        insert(&conn, "Pot 100k", "Passive", 1, "A");
        insert(&conn, "wire_red", "Cable", 1, "A");
        insert(&conn, "wireXred", "Cable", 1, "A");

        assert_eq!(names(&search_components(&conn, "100%").unwrap()), vec!["Pot 100%"]);
        assert_eq!(names(&search_components(&conn, "_").unwrap()), vec!["wire_red"]);
    }

    #[test]
    fn test_low_stock_filters_and_sorts_by_quantity() {
        let conn = setup();
        insert(&conn, "a", "x", 2, "y");
        insert(&conn, "b", "x", 8, "y");
        insert(&conn, "c", "x", 5, "y");
        insert(&conn, "d", "x", 0, "y");

        let quantities: Vec<i64> = list_low_stock(&conn, 5)
            .unwrap()
            .iter()
            .map(|c| c.quantity)
            .collect();

        assert_eq!(quantities, vec![0, 2, 5]);
    }

    #[test]
    fn test_update_and_delete_report_matches() {
        let conn = setup();
        let id = insert(&conn, "Fuse", "Protection", 4, "Box");
        let mut component = get_component(&conn, id).unwrap().unwrap();

        component.quantity = 9;
        assert!(update_component(&conn, &component).unwrap());
        assert_eq!(get_component(&conn, id).unwrap().unwrap().quantity, 9);

        assert!(delete_component(&conn, id).unwrap());
        assert!(!delete_component(&conn, id).unwrap());
        assert!(!update_component(&conn, &component).unwrap());
    }

    #[test]
    fn test_adjust_quantity_bounds() {
        let mut conn = setup();
        let id = insert(&conn, "Relay", "Switch", 3, "Box");

        assert!(matches!(
            adjust_quantity(&mut conn, id, -4),
            Err(StoreError::NegativeQuantity { .. })
        ));
        assert!(matches!(
            adjust_quantity(&mut conn, id, i64::MAX),
            Err(StoreError::QuantityOverflow { .. })
        ));
        assert_eq!(adjust_quantity(&mut conn, id, -3).unwrap(), Some(0));
        assert_eq!(adjust_quantity(&mut conn, 999, 1).unwrap(), None);
        assert_eq!(list_components(&conn).unwrap().len(), 1);
    }

    #[test]
    fn test_corrupt_date_is_a_conversion_error() {
        let conn = setup();
        conn.execute(
            "INSERT INTO components (name, category, quantity, location, acquired_on)
             VALUES ('x', 'y', 1, 'z', 'not a date')",
            [],
        )
        .unwrap();

        assert!(matches!(
            list_components(&conn),
            Err(StoreError::Sqlite(rusqlite::Error::FromSqlConversionFailure(5, _, _)))
        ));
    }

    #[test]
    fn test_like_pattern_escapes() {
        assert_eq!(like_pattern("a%b_c\\"), "%a\\%b\\_c\\\\%");
    }
}
