//! The four fixed table shapes fed by the migration generator.

/// One target column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    /// Optional columns render `NULL` when the row lacks the field.
    pub optional: bool,
}

const fn required(name: &'static str) -> Column {
    Column {
        name,
        optional: false,
    }
}

const fn optional(name: &'static str) -> Column {
    Column {
        name,
        optional: true,
    }
}

/// Everything needed to render upserts into one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableShape {
    /// Heading written at the top of the generated script.
    pub description: &'static str,
    pub table: &'static str,
    /// Insert column order.
    pub columns: &'static [Column],
    /// Natural key used in `ON CONFLICT`.
    pub conflict_key: &'static [&'static str],
    /// Columns overwritten from `EXCLUDED` on conflict.
    pub update_columns: &'static [&'static str],
    /// Column set to `CURRENT_TIMESTAMP` on conflict.
    pub touch_column: Option<&'static str>,
}

impl TableShape {
    /// Column names in insert order.
    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }
}

pub const COLLATERAL: TableShape = TableShape {
    description: "Morpho Collateral History",
    table: "morpho_collateral_history",
    columns: &[
        required("day"),
        required("collateral_token"),
        required("collateral_symbol"),
        required("collateral_amount"),
        optional("collateral_amount_usd"),
    ],
    conflict_key: &["day", "collateral_token"],
    update_columns: &["collateral_amount", "collateral_amount_usd"],
    touch_column: Some("updated_at"),
};

pub const BORROW: TableShape = TableShape {
    description: "Morpho Borrow History",
    table: "morpho_borrow_history",
    columns: &[
        required("day"),
        required("loan_token"),
        required("loan_symbol"),
        required("borrow_amount"),
        optional("borrow_amount_usd"),
    ],
    conflict_key: &["day", "loan_token"],
    update_columns: &["borrow_amount", "borrow_amount_usd"],
    touch_column: Some("updated_at"),
};

pub const DEX_VOLUME: TableShape = TableShape {
    description: "DEX Volume History",
    table: "dex_volume_history",
    columns: &[
        required("date"),
        required("blockchain"),
        required("chain_volume_wld"),
        required("chain_volume_usd"),
        required("chain_num_swaps"),
        required("total_volume_wld"),
        required("total_volume_usd"),
        required("total_num_swaps"),
    ],
    conflict_key: &["date", "blockchain"],
    update_columns: &[
        "chain_volume_wld",
        "chain_volume_usd",
        "chain_num_swaps",
        "total_volume_wld",
        "total_volume_usd",
        "total_num_swaps",
    ],
    touch_column: Some("updated_at"),
};

pub const EARN: TableShape = TableShape {
    description: "Morpho Earn History",
    table: "morpho_earn_history",
    columns: &[
        required("day"),
        required("vault_address"),
        required("vault_symbol"),
        required("vault_asset"),
        required("vault_asset_symbol"),
        required("conversion_rate"),
        required("delta_assets"),
        required("delta_shares"),
        required("total_shares"),
        optional("tvl_usd"),
    ],
    conflict_key: &["day", "vault_address"],
    update_columns: &[
        "conversion_rate",
        "delta_assets",
        "delta_shares",
        "total_shares",
        "tvl_usd",
    ],
    touch_column: Some("updated_at"),
};

/// All shapes in migration order.
pub const ALL: [&TableShape; 4] = [&COLLATERAL, &BORROW, &DEX_VOLUME, &EARN];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_counts() {
        assert_eq!(COLLATERAL.columns.len(), 5);
        assert_eq!(BORROW.columns.len(), 5);
        assert_eq!(DEX_VOLUME.columns.len(), 8);
        assert_eq!(EARN.columns.len(), 10);
    }

    #[test]
    fn test_keys_and_updates_are_columns() {
        for shape in ALL {
            let names = shape.column_names();
            for key in shape.conflict_key {
                assert!(names.contains(key), "{} key {key}", shape.table);
            }
            for col in shape.update_columns {
                assert!(names.contains(col), "{} update {col}", shape.table);
                assert!(!shape.conflict_key.contains(col));
            }
        }
    }

    #[test]
    fn test_only_usd_and_tvl_are_optional() {
        let optional: Vec<_> = ALL
            .iter()
            .flat_map(|s| s.columns.iter())
            .filter(|c| c.optional)
            .map(|c| c.name)
            .collect();
        assert_eq!(
            optional,
            vec!["collateral_amount_usd", "borrow_amount_usd", "tvl_usd"]
        );
    }
}
