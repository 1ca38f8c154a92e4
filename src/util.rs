//! Provides common utility functions
use std::sync::{Arc, RwLock};
use co::backend::{Backend, BackendConfig};
use co::framework::IFramework;
use co::frameworks::Native;
use co::memory::MemoryType;
use co::{IBackend, ITensorDesc, SharedTensor};
use error::Error;

/// Shared Lock used for our tensors
pub type ArcLock<T> = Arc<RwLock<T>>;

/// Create a simple native backend.
///
/// This is handy when you need to sync data to host memory to read/write it.
pub fn native_backend() -> Result<Backend<Native>, Error> {
    let framework = Native::new();
    let hardwares = &framework.hardwares().to_vec();
    let backend_config = BackendConfig::new(framework, hardwares);
    Backend::new(backend_config).map_err(|e| Error::Backend(format!("{:?}", e)))
}

/// Write into a native Collenchyma Memory.
pub fn write_to_memory<T: Copy>(mem: &mut MemoryType, data: &[T]) {
    match mem {
        &mut MemoryType::Native(ref mut mem) => {
            let mem_buffer = mem.as_mut_slice::<T>();
            for (index, datum) in data.iter().enumerate() {
                mem_buffer[index] = *datum;
            }
        },
    }
}

/// Borrow the host memory of a tensor as a slice.
///
/// The tensor has to live on the native device of `backend`.
pub fn native_slice<'a>(backend: &Backend<Native>, tensor: &'a SharedTensor<f32>) -> Result<&'a [f32], Error> {
    let memory = try!(tensor.get(backend.device())
        .ok_or_else(|| Error::Backend("tensor has no memory on the native device".to_owned())));
    let flat = try!(memory.as_native()
        .ok_or_else(|| Error::Backend("tensor memory is not native".to_owned())));
    let slice = flat.as_slice::<f32>();
    Ok(&slice[..tensor.desc().size()])
}

/// Overwrite the host memory of a tensor with `data`.
pub fn write_native(backend: &Backend<Native>, tensor: &mut SharedTensor<f32>, data: &[f32]) -> Result<(), Error> {
    if tensor.desc().size() != data.len() {
        return Err(Error::ShapeMismatch(format!("cannot write {} values into a tensor of shape {:?}",
                                                data.len(), tensor.desc())));
    }
    let memory = try!(tensor.get_mut(backend.device())
        .ok_or_else(|| Error::Backend("tensor has no memory on the native device".to_owned())));
    write_to_memory(memory, data);
    Ok(())
}

/// Create a native Collenchyma SharedTensor of `shape` holding `data`.
pub fn native_tensor(shape: &[usize], data: &[f32]) -> Result<SharedTensor<f32>, Error> {
    let native = try!(native_backend());
    let mut tensor = try!(SharedTensor::<f32>::new(native.device(), &shape.to_vec())
        .map_err(|e| Error::Backend(format!("{:?}", e))));
    try!(write_native(&native, &mut tensor, data));
    Ok(tensor)
}

/// Resize a tensor to `shape` unless it already has it.
pub fn resize_tensor(tensor: &mut SharedTensor<f32>, shape: &[usize]) -> Result<(), Error> {
    if &tensor.desc()[..] == shape {
        return Ok(());
    }
    tensor.resize(&shape.to_vec()).map_err(|e| Error::Backend(format!("{:?}", e)))
}
