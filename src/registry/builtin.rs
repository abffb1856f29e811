use super::template::TemplateComponent;
use super::{ComponentCategory, ComponentRegistry};

const PANDAS: &str = "import pandas as pd";

const NORMALIZE_COLUMNS_FN: &str = "def _normalize_column_names(df):
    df.columns = [str(c).strip().lower().replace(' ', '_') for c in df.columns]
    return df
";

/// Defines the built-in template components and their registration.
macro_rules! define_components {
    ( $( ($id:expr, $category:ident, [$($import:expr),*], [$($dep:expr),*], [$($function:expr),*], $template:expr) ),* $(,)? ) => {
        /// Ids of the components registered by `ComponentRegistry::with_defaults`.
        pub const BUILTIN_COMPONENTS: &[&str] = &[ $( $id ),* ];

        pub(super) fn register_defaults(registry: &mut ComponentRegistry) {
            $(
                registry.register(Box::new(
                    TemplateComponent::new($id, ComponentCategory::$category, $template)
                        .with_imports(&[$($import),*])
                        .with_dependencies(&[$($dep),*])
                        .with_functions(&[$($function),*]),
                ));
            )*
        }
    };
}

define_components! {
    // Inputs
    ("csvFileInput", Input, [PANDAS], [], [],
        "# Read CSV file\n{output} = pd.read_csv(\"{config.filePath}\", sep=\"{config.sep|,}\")\n"),
    ("parquetFileInput", Input, [PANDAS], ["pyarrow"], [],
        "# Read Parquet file\n{output} = pd.read_parquet(\"{config.filePath}\")\n"),
    ("jsonFileInput", Input, [PANDAS], [], [],
        "# Read JSON file\n{output} = pd.read_json(\"{config.filePath}\", lines={config.lines|False})\n"),
    ("excelFileInput", Input, [PANDAS], ["openpyxl"], [],
        "# Read Excel file\n{output} = pd.read_excel(\"{config.filePath}\", sheet_name={config.sheet|0})\n"),
    ("xmlFileInput", Input, [PANDAS], ["lxml"], [],
        "# Read XML file\n{output} = pd.read_xml(\"{config.filePath}\")\n"),

    // Processors
    ("renameColumns", Processor, [PANDAS], [], [],
        "# Rename columns\n{output} = {input}.rename(columns={config.columns})\n"),
    ("filterRows", Processor, [PANDAS], [], [],
        "# Filter rows\n{output} = {input}.query(\"{config.condition}\")\n"),
    ("normalizeColumnNames", Processor, [PANDAS], [], [NORMALIZE_COLUMNS_FN],
        "# Normalize column names\n{output} = _normalize_column_names({input}.copy())\n"),
    ("sqlQuery", Processor, [PANDAS, "import duckdb"], ["duckdb"], [],
        "# Run SQL on the input frame\ninput_df = {input}\n{output} = duckdb.query(\"{config.query}\").to_df()\n"),
    ("join", DoubleProcessor, [PANDAS], [], [],
        "# Join datasets\n{output} = pd.merge({input1}, {input2}, how=\"{config.how|inner}\", on=\"{config.on}\")\n"),
    ("concat", MultiProcessor, [PANDAS], [], [],
        "# Concatenate datasets\n{output} = pd.concat({inputs}, ignore_index=True)\n"),

    // Outputs
    ("csvFileOutput", Output, [PANDAS], [], [],
        "# Write CSV file\n{input}.to_csv(\"{config.filePath}\", sep=\"{config.sep|,}\", index=False)\n"),
    ("parquetFileOutput", Output, [PANDAS], ["pyarrow"], [],
        "# Write Parquet file\n{input}.to_parquet(\"{config.filePath}\", index=False)\n"),

    // Loggers
    ("consoleLogger", Logger, ["from datetime import datetime"], [], [],
        "print(f\"[{{datetime.now()}}] Pipeline failed: {{e}}\")\n"),
}
