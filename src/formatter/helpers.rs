use super::shapes::shapes_table;
use super::{Formatter, Sql};

pub(super) fn is_bcp_47_code() -> Formatter {
    // rough check against the BCP 47 "langtag" production
    Formatter::new().setup(Sql::dynamic(|opts| {
        format!(
            r#"CREATE OR REPLACE FUNCTION {schema}.is_bcp_47_code(
	string TEXT
)
RETURNS BOOLEAN
AS $$
	SELECT string ~ '^[a-zA-Z]{{2,3}}(-[a-zA-Z]{{3}}){{0,3}}(-[a-zA-Z]{{4}})?(-([a-zA-Z]{{2}}|[0-9]{{3}}))?(-([a-zA-Z0-9]{{5,8}}|[0-9][a-zA-Z0-9]{{3}}))*(-[a-wyzA-WYZ0-9](-[a-zA-Z0-9]{{2,8}})+)*(-x(-[a-zA-Z0-9]{{1,8}})+)?$';
$$ LANGUAGE sql IMMUTABLE;

"#,
            schema = opts.schema(),
        )
    }))
}

pub(super) fn is_timezone() -> Formatter {
    Formatter::new().setup(Sql::dynamic(|opts| {
        format!(
            r#"CREATE OR REPLACE FUNCTION {schema}.is_timezone(
	tz TEXT
)
RETURNS BOOLEAN
AS $$
	DECLARE
		date TIMESTAMPTZ;
	BEGIN
		date := now() AT TIME ZONE tz;
		RETURN TRUE;
	EXCEPTION WHEN invalid_parameter_value THEN
		RETURN FALSE;
	END;
$$ LANGUAGE plpgsql STABLE;

"#,
            schema = opts.schema(),
        )
    }))
}

/// Backs the `trips.shape_id` check. The function body is checked on
/// creation, so an empty `shapes` table is created if no file provided one.
pub(super) fn shape_exists() -> Formatter {
    Formatter::new().setup(Sql::dynamic(|opts| {
        format!(
            r#"{shapes_ddl}
CREATE OR REPLACE FUNCTION {schema}.shape_exists(
	some_shape_id TEXT
)
RETURNS BOOLEAN
AS $$
	SELECT EXISTS (
		SELECT shape_id
		FROM {shapes}
		WHERE shape_id = some_shape_id
		LIMIT 1
	);
$$ LANGUAGE sql STABLE;

"#,
            schema = opts.schema(),
            shapes = opts.qualify("shapes"),
            shapes_ddl = shapes_table(opts, true),
        )
    }))
}
