use futures::future::LocalBoxFuture;

/// Puerto para lanzar futuros `?Send` en el event loop local
pub trait Spawner {
    fn spawn_local(&self, fut: LocalBoxFuture<'static, ()>);
}

/// Adaptador del navegador sobre wasm_bindgen_futures
#[cfg(target_arch = "wasm32")]
#[derive(Clone, Copy, Default)]
pub struct WasmSpawner;

#[cfg(target_arch = "wasm32")]
impl Spawner for WasmSpawner {
    fn spawn_local(&self, fut: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(fut);
    }
}

/// Spawner de tests sobre un LocalPool de futures
#[cfg(test)]
pub(crate) struct PoolSpawner(pub futures::executor::LocalSpawner);

#[cfg(test)]
impl Spawner for PoolSpawner {
    fn spawn_local(&self, fut: LocalBoxFuture<'static, ()>) {
        use futures::task::LocalSpawnExt;
        self.0.spawn_local(fut).expect("spawn_local falló");
    }
}
