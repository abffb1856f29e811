use crate::compiler::{CompiledPipeline, Compiler, NO_TARGET};
use crate::flow::parse_flow;
use crate::registry::ComponentRegistry;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

impl<'py> IntoPyObject<'py> for CompiledPipeline {
    type Target = PyDict;
    type Output = Bound<'py, Self::Target>;
    type Error = PyErr;

    fn into_pyobject(self, py: Python<'py>) -> Result<Self::Output, Self::Error> {
        let dict = PyDict::new(py);
        dict.set_item("source", self.source)?;
        dict.set_item("order", self.order)?;
        dict.set_item("dependencies", self.dependencies)?;
        dict.set_item("warnings", self.warnings)?;

        // Insertion order of the dict follows emission order.
        let bindings = PyDict::new(py);
        for binding in self.bindings {
            bindings.set_item(binding.node_id, binding.variable)?;
        }
        dict.set_item("bindings", bindings)?;

        Ok(dict)
    }
}

fn value_error(e: impl std::fmt::Display) -> PyErr {
    PyErr::new::<PyValueError, _>(e.to_string())
}

fn build_compiler(manifest: Option<&str>) -> PyResult<Compiler> {
    let mut registry = ComponentRegistry::with_defaults();
    if let Some(manifest) = manifest {
        registry.load_manifest(manifest).map_err(value_error)?;
    }
    Ok(Compiler::builder(registry).build())
}

/// Compiles Amphi pipelines into Python scripts.
///
/// The component registry is built once on initialization; `compile` can
/// then be called repeatedly with different flows.
#[pyclass(name = "PipelineCompiler")]
struct PipelineCompilerPy {
    compiler: Compiler,
}

impl PipelineCompilerPy {
    fn compile_artifact(&self, flow_json: &str, target: Option<&str>) -> PyResult<CompiledPipeline> {
        let flow = parse_flow(flow_json).map_err(value_error)?;
        self.compiler
            .compile_until(&flow, target.unwrap_or(NO_TARGET))
            .map_err(value_error)
    }
}

#[pymethods]
impl PipelineCompilerPy {
    /// Initializes the compiler with the built-in components.
    ///
    /// Args:
    ///     manifest (str | None): A JSON array of template component
    ///         definitions registered on top of the built-ins.
    ///
    /// Raises:
    ///     ValueError: If the manifest is malformed or declares an
    ///         unknown category.
    #[new]
    #[pyo3(signature = (manifest=None))]
    fn new(manifest: Option<&str>) -> PyResult<Self> {
        Ok(PipelineCompilerPy {
            compiler: build_compiler(manifest)?,
        })
    }

    /// Compiles a flow into a Python script.
    ///
    /// Args:
    ///     flow_json (str): An `.ampln` document or a bare `{nodes, edges}` flow.
    ///     target (str | None): Node to stop at. The script then ends with
    ///         the node's output variable. `None` or `"none"` compiles
    ///         the whole pipeline.
    ///
    /// Returns:
    ///     str: The generated source code.
    ///
    /// Raises:
    ///     ValueError: If the flow cannot be parsed or compiled.
    #[pyo3(signature = (flow_json, target=None))]
    fn compile(&self, flow_json: &str, target: Option<&str>) -> PyResult<String> {
        Ok(self.compile_artifact(flow_json, target)?.source)
    }

    /// Compiles a flow and returns the full result as a dict with the keys
    /// `source`, `order`, `bindings`, `dependencies` and `warnings`.
    #[pyo3(signature = (flow_json, target=None))]
    fn compile_pipeline(&self, flow_json: &str, target: Option<&str>) -> PyResult<CompiledPipeline> {
        self.compile_artifact(flow_json, target)
    }

    /// Returns `(node_id, variable)` pairs for every emitted node, in
    /// emission order.
    #[pyo3(signature = (flow_json, target=None))]
    fn output_bindings(&self, flow_json: &str, target: Option<&str>) -> PyResult<Vec<(String, String)>> {
        let compiled = self.compile_artifact(flow_json, target)?;
        Ok(compiled
            .bindings
            .into_iter()
            .map(|b| (b.node_id, b.variable))
            .collect())
    }
}

/// Compiles a flow with the built-in components plus an optional manifest.
#[pyfunction]
#[pyo3(signature = (flow_json, target=None, manifest=None))]
fn compile(flow_json: &str, target: Option<&str>, manifest: Option<&str>) -> PyResult<String> {
    let compiler = PipelineCompilerPy {
        compiler: build_compiler(manifest)?,
    };
    compiler.compile(flow_json, target)
}

/// Python bindings to the Amphi pipeline compiler.
#[pymodule]
fn amphi_codegen(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PipelineCompilerPy>()?;
    m.add_function(wrap_pyfunction!(compile, m)?)?;
    Ok(())
}
