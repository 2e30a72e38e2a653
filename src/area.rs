use std::io::{self, Write};

use geo::{Area, Coord, MapCoords};
use log::info;
use proj::Proj;
use serde_json::Value as JsonValue;

use crate::crs::Crs;
use crate::error::{PipelineError, Result};
use crate::table::FeatureTable;

pub const AREA_M2_COLUMN: &str = "area_m2";
pub const AREA_HA_COLUMN: &str = "area_ha";

const SQUARE_METRES_PER_HECTARE: f64 = 10_000.0;

/// Reprojects every geometry of `table` into `target`.
///
/// The table must carry a CRS. Input coordinates are taken in the
/// visualisation axis order (longitude/easting first).
pub fn reproject(table: &FeatureTable, target: &Crs) -> Result<FeatureTable> {
    let source = table.crs.as_ref().ok_or_else(|| {
        PipelineError::Schema("cannot reproject a table without a CRS".to_string())
    })?;

    let mut projected = table.clone();
    projected.crs = Some(target.clone());
    if source == target {
        return Ok(projected);
    }

    info!("Reprojecting {} rows from {} to {}", table.len(), source, target);
    let from = source.to_string();
    let to = target.to_string();
    let proj = Proj::new_known_crs(&from, &to, None).map_err(|source| {
        PipelineError::ProjectionSetup {
            from: from.clone(),
            to: to.clone(),
            source,
        }
    })?;

    for (row, record) in projected.records_mut().iter_mut().enumerate() {
        if let Some(geometry) = &record.geometry {
            let transformed = geometry
                .try_map_coords(|c: Coord<f64>| {
                    proj.convert((c.x, c.y)).map(|(x, y)| Coord { x, y })
                })
                .map_err(|source| PipelineError::Projection { row, source })?;
            record.geometry = Some(transformed);
        }
    }

    Ok(projected)
}

/// Adds `area_m2` and `area_ha` to a table in a metric CRS.
/// Rows without geometry get `null` in both columns.
pub fn add_area_columns(table: &mut FeatureTable) -> Result<()> {
    let areas: Vec<Option<f64>> = table
        .records()
        .iter()
        .map(|r| r.geometry.as_ref().map(|g| g.unsigned_area()))
        .collect();

    let square_metres = areas.iter().map(|a| area_value(*a)).collect();
    let hectares = areas
        .iter()
        .map(|a| area_value(a.map(|m2| m2 / SQUARE_METRES_PER_HECTARE)))
        .collect();

    table.set_column(AREA_M2_COLUMN, square_metres)?;
    table.set_column(AREA_HA_COLUMN, hectares)?;
    Ok(())
}

fn area_value(area: Option<f64>) -> JsonValue {
    area.map(JsonValue::from).unwrap_or(JsonValue::Null)
}

/// Writes the first `rows` rows of the area columns, with their row index.
pub fn write_area_head<W: Write>(table: &FeatureTable, rows: usize, out: &mut W) -> io::Result<()> {
    writeln!(out, "{:<6}{:>20}{:>16}", "", AREA_M2_COLUMN, AREA_HA_COLUMN)?;
    let m2 = table.column(AREA_M2_COLUMN);
    let ha = table.column(AREA_HA_COLUMN);
    for (index, (m2, ha)) in m2.zip(ha).take(rows).enumerate() {
        writeln!(out, "{:<6}{:>20}{:>16}", index, format_area(m2), format_area(ha))?;
    }
    Ok(())
}

/// Prints the head of the area columns to stdout as a sanity check.
pub fn print_area_head(table: &FeatureTable, rows: usize) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_area_head(table, rows, &mut handle).map_err(|e| PipelineError::io("<stdout>", e))
}

fn format_area(value: Option<&JsonValue>) -> String {
    match value.and_then(JsonValue::as_f64) {
        Some(v) => format!("{:.6}", v),
        None => "NaN".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Record;
    use geo::{line_string, point, polygon, Geometry, Polygon};
    use geojson::JsonObject;

    fn square(min_x: f64, min_y: f64, side: f64) -> Polygon<f64> {
        polygon![
            (x: min_x, y: min_y),
            (x: min_x + side, y: min_y),
            (x: min_x + side, y: min_y + side),
            (x: min_x, y: min_y + side),
            (x: min_x, y: min_y),
        ]
    }

    fn projected_table(geometries: Vec<Option<Geometry<f64>>>) -> FeatureTable {
        let mut table = FeatureTable::new(Some(Crs::british_national_grid()));
        for geometry in geometries {
            table.push(Record::new(JsonObject::new(), geometry));
        }
        table
    }

    #[test]
    fn square_area_in_metres_and_hectares() {
        let mut table = projected_table(vec![Some(square(400_000.0, 300_000.0, 250.0).into())]);
        add_area_columns(&mut table).unwrap();

        let m2 = table.records()[0].attributes[AREA_M2_COLUMN].as_f64().unwrap();
        let ha = table.records()[0].attributes[AREA_HA_COLUMN].as_f64().unwrap();
        assert!((m2 - 62_500.0).abs() < 1e-6);
        assert_eq!(ha, m2 / 10_000.0);
        assert_eq!(table.columns(), [AREA_M2_COLUMN, AREA_HA_COLUMN]);
    }

    #[test]
    fn area_ignores_ring_orientation_and_subtracts_holes() {
        let outer = square(0.0, 0.0, 10.0);
        let clockwise = Polygon::new(
            line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 10.0), (x: 10.0, y: 10.0), (x: 10.0, y: 0.0), (x: 0.0, y: 0.0)],
            vec![],
        );
        let holed = Polygon::new(outer.exterior().clone(), vec![square(2.0, 2.0, 2.0).exterior().clone()]);

        let mut table = projected_table(vec![
            Some(clockwise.into()),
            Some(holed.into()),
            Some(point!(x: 1.0, y: 1.0).into()),
            None,
        ]);
        add_area_columns(&mut table).unwrap();

        let areas: Vec<_> = table.column(AREA_M2_COLUMN).map(|v| v.and_then(JsonValue::as_f64)).collect();
        assert_eq!(areas, [Some(100.0), Some(96.0), Some(0.0), None]);
        assert!(table.records()[3].attributes[AREA_HA_COLUMN].is_null());
    }

    #[test]
    fn reproject_requires_a_crs() {
        let table = FeatureTable::new(None);
        assert!(matches!(
            reproject(&table, &Crs::british_national_grid()),
            Err(PipelineError::Schema(_))
        ));
    }

    #[test]
    fn reproject_to_same_crs_is_identity() {
        let table = projected_table(vec![Some(square(0.0, 0.0, 1.0).into())]);
        let projected = reproject(&table, &Crs::british_national_grid()).unwrap();
        assert_eq!(projected.records(), table.records());
    }

    #[test]
    fn reproject_wgs84_to_bng() {
        let mut table = FeatureTable::new(Some(Crs::wgs84()));
        // Greenwich meridian, roughly at the Royal Observatory
        table.push(Record::new(JsonObject::new(), Some(point!(x: 0.0, y: 51.4779).into())));

        let projected = reproject(&table, &Crs::british_national_grid()).unwrap();
        assert_eq!(projected.crs, Some(Crs::british_national_grid()));
        match &projected.records()[0].geometry {
            Some(Geometry::Point(p)) => {
                assert!((p.x() - 538_880.0).abs() < 1_000.0, "easting {}", p.x());
                assert!((p.y() - 177_300.0).abs() < 1_000.0, "northing {}", p.y());
            }
            other => panic!("unexpected geometry {:?}", other),
        }
    }

    #[test]
    fn head_lists_requested_rows() {
        let mut table = projected_table(vec![
            Some(square(0.0, 0.0, 100.0).into()),
            Some(square(0.0, 0.0, 10.0).into()),
            None,
        ]);
        add_area_columns(&mut table).unwrap();

        let mut out = Vec::new();
        write_area_head(&table, 2, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("area_m2") && lines[0].contains("area_ha"));
        assert!(lines[1].starts_with('0') && lines[1].contains("10000.000000") && lines[1].contains("1.000000"));
        assert!(lines[2].contains("100.000000") && lines[2].contains("0.010000"));
    }
}
